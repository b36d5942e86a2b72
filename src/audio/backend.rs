use crate::error::CaptureError;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Advisory capture constraints.
///
/// Backends apply what the device supports and silently ignore the rest;
/// callers must not assume any of these were honored.
#[derive(Debug, Clone, Copy)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// Audio capture backend trait.
///
/// The concrete implementation owns the input device handle. Dropping the
/// frame receiver signals the backend to stop and release the device, so the
/// microphone is never left open across attempts.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Start capturing audio.
    ///
    /// Returns a channel receiver that will receive audio frames.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Stop capturing audio and release the device.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if backend is currently capturing.
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging.
    fn name(&self) -> &str;
}

/// Capture backend factory.
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create the microphone backend for this platform.
    pub fn microphone(
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        Ok(Box::new(super::microphone::MicrophoneBackend::new(
            constraints,
        )))
    }
}
