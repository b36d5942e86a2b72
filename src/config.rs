use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub compose: ComposeConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Public origin of the app, used when composing shareable URLs
    /// (e.g. "https://voicecaster.xyz").
    pub origin: String,

    /// Fixed target of the POST /api/redirect route.
    pub redirect_target: String,

    /// Directory used by the share composer's file-download fallback.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the object storage gateway (e.g. a Supabase project URL).
    pub base_url: String,

    /// Bucket holding uploaded recordings and preview images.
    pub bucket: String,

    /// API key sent as a bearer token on uploads.
    pub api_key: String,

    /// Cache-control hint attached to uploaded objects, in seconds.
    #[serde(default = "default_storage_cache_secs")]
    pub cache_max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeConfig {
    /// Base URL of the host platform's compose integration.
    pub endpoint: String,
}

/// Capture tuning. These are product-tuning defaults, not contracts.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Hard cap on a single capture. Reaching it finalizes the partial
    /// recording rather than failing.
    #[serde(default = "default_max_capture_secs")]
    pub max_duration_secs: u64,

    #[serde(default = "default_true")]
    pub echo_cancellation: bool,

    #[serde(default = "default_true")]
    pub noise_suppression: bool,

    #[serde(default = "default_true")]
    pub auto_gain: bool,
}

/// Video synthesis tuning. Grace delay and frame interval are deliberately
/// configurable rather than derived.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_frame_size")]
    pub width: u32,

    #[serde(default = "default_frame_size")]
    pub height: u32,

    /// Period of the frame redraw clock, in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Trailing delay after the audio ends, to flush final frames.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

fn default_storage_cache_secs() -> u64 {
    3600
}

fn default_max_capture_secs() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

fn default_frame_size() -> u32 {
    720
}

fn default_frame_interval_ms() -> u64 {
    125
}

fn default_stop_grace_ms() -> u64 {
    500
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_capture_secs(),
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_frame_size(),
            height: default_frame_size(),
            frame_interval_ms: default_frame_interval_ms(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
