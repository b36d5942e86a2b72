use crate::audio::{
    select_encoding, AudioEncoding, BuiltinCodecs, CaptureBackend, CaptureBackendFactory,
    CaptureConstraints, ENCODING_PREFERENCES,
};
use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// One completed microphone capture.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Encoded clip bytes.
    pub bytes: Vec<u8>,

    /// MIME type declared by the selected encoding.
    pub mime_type: String,

    /// Clip duration in seconds. Taken from the decoded sample count when
    /// decoding succeeds, else the wall-clock capture timer.
    pub duration_secs: f64,

    pub created_at: DateTime<Utc>,
}

/// Recorder tuning for one session.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Hard cap on capture length; reaching it finalizes the partial capture.
    pub max_duration: Duration,

    /// Advisory device constraints.
    pub constraints: CaptureConstraints,

    /// Ordered encoding preference list, probed top-down.
    pub preferences: Vec<AudioEncoding>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(90),
            constraints: CaptureConstraints::default(),
            preferences: ENCODING_PREFERENCES.to_vec(),
        }
    }
}

impl From<&crate::config::CaptureConfig> for RecorderConfig {
    fn from(cfg: &crate::config::CaptureConfig) -> Self {
        Self {
            max_duration: Duration::from_secs(cfg.max_duration_secs),
            constraints: CaptureConstraints {
                echo_cancellation: cfg.echo_cancellation,
                noise_suppression: cfg.noise_suppression,
                auto_gain: cfg.auto_gain,
            },
            preferences: ENCODING_PREFERENCES.to_vec(),
        }
    }
}

#[derive(Default)]
struct PcmBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

/// A capture session: one microphone attempt producing at most one Recording.
///
/// The session exclusively owns the device handle for its lifetime and
/// releases it on every exit path. "Record again" means dropping this session
/// and creating a fresh one.
pub struct CaptureSession {
    config: RecorderConfig,

    /// Encoding chosen by the capability probe at construction time.
    encoding: AudioEncoding,

    backend: Mutex<Option<Box<dyn CaptureBackend>>>,

    /// Accumulated mono PCM.
    buffer: Arc<Mutex<PcmBuffer>>,

    is_capturing: Arc<AtomicBool>,

    started_at: Mutex<Option<Instant>>,

    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureSession {
    /// Create a session over the platform microphone.
    pub fn microphone(config: RecorderConfig) -> Result<Self, CaptureError> {
        let constraints = config.constraints;
        let backend = CaptureBackendFactory::microphone(constraints)?;
        Self::with_backend(config, backend)
    }

    /// Create a session over an explicit backend (used by tests).
    pub fn with_backend(
        config: RecorderConfig,
        backend: Box<dyn CaptureBackend>,
    ) -> Result<Self, CaptureError> {
        // Capability check happens before any capture work begins.
        let encoding = select_encoding(&config.preferences, &BuiltinCodecs).ok_or_else(|| {
            CaptureError::Unsupported("no supported audio encoding available".into())
        })?;

        Ok(Self {
            config,
            encoding,
            backend: Mutex::new(Some(backend)),
            buffer: Arc::new(Mutex::new(PcmBuffer::default())),
            is_capturing: Arc::new(AtomicBool::new(false)),
            started_at: Mutex::new(None),
            task_handle: Mutex::new(None),
        })
    }

    /// The encoding the probe selected for this session.
    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    /// Start capturing. Frames accumulate until `stop` or the duration cap.
    pub async fn start(&self) -> Result<(), CaptureError> {
        if self.is_capturing.load(Ordering::SeqCst) {
            warn!("Capture already started");
            return Ok(());
        }

        let mut rx = {
            let mut backend = self.backend.lock().await;
            let backend = backend
                .as_mut()
                .ok_or_else(|| CaptureError::Backend("session already consumed".into()))?;
            info!("Starting capture via {}", backend.name());
            backend.start().await?
        };

        self.is_capturing.store(true, Ordering::SeqCst);
        {
            let mut started = self.started_at.lock().await;
            *started = Some(Instant::now());
        }

        let buffer = Arc::clone(&self.buffer);
        let is_capturing = Arc::clone(&self.is_capturing);
        let max_ms = self.config.max_duration.as_millis() as u64;

        let task = tokio::spawn(async move {
            // The loop ends when the backend closes the channel or the cap is
            // reached. Dropping `rx` tells the backend to release the device.
            while let Some(frame) = rx.recv().await {
                let reached_cap = frame.timestamp_ms >= max_ms;

                {
                    let mut buf = buffer.lock().await;
                    if buf.sample_rate == 0 {
                        buf.sample_rate = frame.sample_rate;
                        buf.channels = frame.channels;
                    }
                    buf.samples.extend_from_slice(&frame.samples);
                }

                if reached_cap {
                    info!("Capture cap reached ({} ms); finalizing partial recording", max_ms);
                    is_capturing.store(false, Ordering::SeqCst);
                    break;
                }
            }
        });

        {
            let mut handle = self.task_handle.lock().await;
            *handle = Some(task);
        }

        Ok(())
    }

    /// Stop capturing and finalize the Recording.
    pub async fn stop(&self) -> Result<Recording, CaptureError> {
        self.is_capturing.store(false, Ordering::SeqCst);

        // Release the device before touching the buffer, on every path. The
        // backend is taken, not borrowed: a session records at most once and
        // a later `start` fails instead of reusing a stopped device.
        {
            let mut backend = self.backend.lock().await;
            if let Some(mut backend) = backend.take() {
                backend.stop().await?;
            }
        }

        {
            let mut handle = self.task_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    warn!("Capture task panicked: {}", e);
                }
            }
        }

        let wall_clock_secs = {
            let started = self.started_at.lock().await;
            started
                .ok_or_else(|| CaptureError::Backend("capture never started".into()))?
                .elapsed()
                .as_secs_f64()
        };

        let (samples, sample_rate, channels) = {
            let mut buf = self.buffer.lock().await;
            (
                std::mem::take(&mut buf.samples),
                buf.sample_rate,
                buf.channels,
            )
        };

        if samples.is_empty() {
            return Err(CaptureError::EmptyCapture);
        }

        let encoding = self.encoding;
        let bytes = tokio::task::spawn_blocking(move || {
            crate::audio::encode::encode(encoding, &samples, sample_rate, channels)
        })
        .await
        .map_err(|e| CaptureError::Backend(format!("encode task failed: {}", e)))?
        .map_err(|e| CaptureError::Backend(e.to_string()))?;

        if bytes.is_empty() {
            return Err(CaptureError::EmptyCapture);
        }

        // Prefer the decoded duration; the wall-clock timer is the fallback
        // when decoding yields nothing finite.
        let decode_input = bytes.clone();
        let duration_secs =
            match tokio::task::spawn_blocking(move || crate::audio::decode(&decode_input)).await {
                Ok(Ok(decoded)) => {
                    let d = decoded.duration_seconds();
                    if d.is_finite() && d > 0.0 {
                        d
                    } else {
                        wall_clock_secs
                    }
                }
                _ => {
                    warn!("Decode failed; falling back to wall-clock duration");
                    wall_clock_secs
                }
            };

        if duration_secs <= 0.0 {
            return Err(CaptureError::EmptyCapture);
        }

        info!(
            "Capture complete: {:.2}s, {} bytes, {}",
            duration_secs,
            bytes.len(),
            self.encoding.mime_type()
        );

        Ok(Recording {
            bytes,
            mime_type: self.encoding.mime_type().to_string(),
            duration_secs,
            created_at: Utc::now(),
        })
    }
}
