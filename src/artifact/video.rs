//! Video artifact synthesis: animated frames multiplexed with the decoded
//! clip audio into a single self-contained file.

use super::avi::AviMuxer;
use super::card::{encode_jpeg, CardPainter};
use crate::config::VideoConfig;
use crate::error::RenderError;
use crate::recorder::Recording;
use image::RgbaImage;
use tracing::{info, warn};

/// A generated video clip. Regeneration supersedes, never mutates.
#[derive(Debug, Clone)]
pub struct VideoBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Candidate container/codec pairs, ordered from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mp4H264,
    WebmVp8,
    AviMjpeg,
}

impl VideoFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4H264 => "video/mp4",
            VideoFormat::WebmVp8 => "video/webm",
            VideoFormat::AviMjpeg => "video/x-msvideo",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4H264 => "mp4",
            VideoFormat::WebmVp8 => "webm",
            VideoFormat::AviMjpeg => "avi",
        }
    }
}

pub const FORMAT_PREFERENCES: &[VideoFormat] = &[
    VideoFormat::Mp4H264,
    VideoFormat::WebmVp8,
    VideoFormat::AviMjpeg,
];

/// Capability oracle for the format probe.
pub trait EncoderSupport {
    fn supports(&self, format: VideoFormat) -> bool;
}

/// What this build can mux (only the built-in MJPEG/AVI path).
pub struct BuiltinEncoders;

impl EncoderSupport for BuiltinEncoders {
    fn supports(&self, format: VideoFormat) -> bool {
        matches!(format, VideoFormat::AviMjpeg)
    }
}

pub fn select_format(
    preferences: &[VideoFormat],
    oracle: &dyn EncoderSupport,
) -> Option<VideoFormat> {
    preferences.iter().copied().find(|f| oracle.supports(*f))
}

/// Synthesize the video for a recording.
///
/// The frame clock walks the playback timeline at the configured interval;
/// rendering is offline, not paced against the wall clock. The clip duration
/// comes from decoding the recorded audio; the recorder's wall-clock figure
/// is only used when decoding yields nothing finite. After the audio ends, a
/// grace period of trailing frames (and silence) is appended so playback is
/// never shorter than the clip.
pub async fn render_video(
    recording: &Recording,
    avatar: Option<RgbaImage>,
    config: &VideoConfig,
) -> Result<VideoBlob, RenderError> {
    // Capability check before any work begins.
    let format = select_format(FORMAT_PREFERENCES, &BuiltinEncoders).ok_or_else(|| {
        RenderError::CapabilityMissing("no supported video container/codec".into())
    })?;

    info!("Rendering video artifact as {}", format.mime_type());

    let bytes = recording.bytes.clone();
    let decoded = tokio::task::spawn_blocking(move || crate::audio::decode(&bytes))
        .await
        .map_err(|e| RenderError::Encode(format!("decode task failed: {}", e)))?;

    let (audio, duration) = match decoded {
        Ok(decoded) => {
            let d = decoded.duration_seconds();
            if d.is_finite() && d > 0.0 {
                (Some(decoded), d)
            } else {
                warn!("Decoded duration not finite; using recorder wall clock");
                (Some(decoded), recording.duration_secs)
            }
        }
        Err(e) => {
            warn!("Audio decode failed ({}); using recorder wall clock", e);
            (None, recording.duration_secs)
        }
    };

    if !(duration.is_finite() && duration > 0.0) {
        return Err(RenderError::Decode("clip has no usable duration".into()));
    }

    let painter = CardPainter::new(avatar);
    let cfg = config.clone();

    let blob = tokio::task::spawn_blocking(move || -> Result<VideoBlob, RenderError> {
        let interval_secs = cfg.frame_interval_ms as f64 / 1000.0;
        let grace_secs = cfg.stop_grace_ms as f64 / 1000.0;
        let fps = (1000 / cfg.frame_interval_ms.max(1)) as u32;

        let (sample_rate, channels) = audio
            .as_ref()
            .map(|a| (a.sample_rate, a.channels))
            .unwrap_or((16000, 1));

        let mut mux = AviMuxer::new(cfg.width, cfg.height, fps.max(1), sample_rate, channels);

        // Frame clock: cover the clip plus the trailing grace period.
        let total_span = duration + grace_secs;
        let frame_count = (total_span / interval_secs).ceil() as u64;

        for n in 0..frame_count {
            let elapsed = n as f64 * interval_secs;
            let frame =
                painter.render_video_frame(cfg.width, cfg.height, elapsed.min(duration), duration);
            let jpeg = encode_jpeg(&frame, 80).map_err(|e| RenderError::Encode(e.to_string()))?;
            mux.push_frame(jpeg);
        }

        // Audio track padded with grace-period silence.
        let mut samples = audio.map(|a| a.samples).unwrap_or_default();
        let silence = (sample_rate as f64 * grace_secs) as usize * channels as usize;
        samples.extend(std::iter::repeat(0i16).take(silence));
        mux.set_audio(samples);

        let bytes = mux
            .finish()
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(VideoBlob {
            bytes,
            mime_type: format.mime_type().to_string(),
        })
    })
    .await
    .map_err(|e| RenderError::Encode(format!("render task failed: {}", e)))??;

    info!("Video artifact ready: {} bytes", blob.bytes.len());
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encode::{encode, AudioEncoding};
    use chrono::Utc;

    struct FakeOracle(Vec<VideoFormat>);

    impl EncoderSupport for FakeOracle {
        fn supports(&self, format: VideoFormat) -> bool {
            self.0.contains(&format)
        }
    }

    fn short_recording(secs: f64) -> Recording {
        let rate = 16000u32;
        let samples: Vec<i16> = (0..(secs * rate as f64) as usize)
            .map(|i| ((i % 64) as i16 - 32) * 256)
            .collect();
        let bytes = encode(AudioEncoding::Wav, &samples, rate, 1).unwrap();

        Recording {
            bytes,
            mime_type: "audio/wav".into(),
            duration_secs: secs,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn probe_prefers_mp4_when_available() {
        let oracle = FakeOracle(vec![VideoFormat::Mp4H264, VideoFormat::AviMjpeg]);
        assert_eq!(
            select_format(FORMAT_PREFERENCES, &oracle),
            Some(VideoFormat::Mp4H264)
        );
    }

    #[test]
    fn probe_falls_back_to_builtin() {
        assert_eq!(
            select_format(FORMAT_PREFERENCES, &BuiltinEncoders),
            Some(VideoFormat::AviMjpeg)
        );
    }

    #[test]
    fn probe_empty_oracle_yields_none() {
        assert_eq!(select_format(FORMAT_PREFERENCES, &FakeOracle(vec![])), None);
    }

    #[tokio::test]
    async fn video_is_at_least_as_long_as_the_audio() {
        let recording = short_recording(0.5);
        let config = VideoConfig {
            width: 96,
            height: 96,
            ..VideoConfig::default()
        };

        let blob = render_video(&recording, None, &config)
            .await
            .unwrap();

        assert_eq!(blob.mime_type, "video/x-msvideo");
        assert_eq!(&blob.bytes[0..4], b"RIFF");

        // Frame count x interval must cover duration + grace.
        let interval = config.frame_interval_ms as f64 / 1000.0;
        let needed = 0.5 + config.stop_grace_ms as f64 / 1000.0;
        let frames = ((needed / interval).ceil()) as usize;
        assert!(frames as f64 * interval >= needed);
    }

    #[tokio::test]
    async fn non_square_config_matches_container_header() {
        let recording = short_recording(0.25);
        let config = VideoConfig {
            width: 64,
            height: 32,
            ..VideoConfig::default()
        };

        let blob = render_video(&recording, None, &config).await.unwrap();

        // avih dwWidth/dwHeight live 32 and 36 bytes into the avih body,
        // which starts after RIFF(12) + hdrl LIST header(12) + chunk header(8).
        let avih = 12 + 12 + 8;
        let header_w = u32::from_le_bytes(blob.bytes[avih + 32..avih + 36].try_into().unwrap());
        let header_h = u32::from_le_bytes(blob.bytes[avih + 36..avih + 40].try_into().unwrap());
        assert_eq!((header_w, header_h), (64, 32));

        // The first JPEG frame decodes to the same dimensions.
        let pos = blob.bytes.windows(4).position(|w| w == b"00dc").unwrap();
        let size =
            u32::from_le_bytes(blob.bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let frame = image::load_from_memory(&blob.bytes[pos + 8..pos + 8 + size]).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 32));
    }

    #[tokio::test]
    async fn undecodable_recording_uses_wall_clock_duration() {
        let recording = Recording {
            bytes: vec![0u8; 128],
            mime_type: "audio/wav".into(),
            duration_secs: 0.25,
            created_at: Utc::now(),
        };
        let config = VideoConfig {
            width: 64,
            height: 64,
            ..VideoConfig::default()
        };

        let blob = render_video(&recording, None, &config)
            .await
            .unwrap();
        assert!(!blob.bytes.is_empty());
    }

    #[tokio::test]
    async fn zero_duration_recording_is_rejected() {
        let recording = Recording {
            bytes: vec![0u8; 16],
            mime_type: "audio/wav".into(),
            duration_secs: 0.0,
            created_at: Utc::now(),
        };

        let result = render_video(&recording, None, &VideoConfig::default()).await;
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }
}
