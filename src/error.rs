//! Error taxonomy for the recording-to-share pipeline.
//!
//! Every variant is terminal for the attempt that raised it: nothing here is
//! retried automatically. Callers surface the message to the user together
//! with a manual fallback where one exists.

use thiserror::Error;

/// Microphone capture failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device available")]
    NoInputDevice,

    #[error("microphone access denied: {0}")]
    AccessDenied(String),

    #[error("audio capture not supported on this host: {0}")]
    Unsupported(String),

    /// The capture nominally succeeded but produced zero bytes.
    #[error("capture produced no audio data")]
    EmptyCapture,

    #[error("capture backend failed: {0}")]
    Backend(String),
}

/// Storage gateway failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("refusing to upload empty payload for {0}")]
    EmptyPayload(String),

    #[error("storage gateway rejected {filename}: {reason}")]
    Rejected { filename: String, reason: String },

    #[error("storage gateway unreachable: {0}")]
    Transport(String),
}

/// Artifact rendering failures (link preview image, video synthesis).
#[derive(Debug, Error)]
pub enum RenderError {
    /// Detected before any work begins; no partial attempt is made.
    #[error("required media capability missing: {0}")]
    CapabilityMissing(String),

    #[error("audio decode failed: {0}")]
    Decode(String),

    #[error("media encoding failed: {0}")]
    Encode(String),
}

/// Compose / native share integration failures.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("compose integration unavailable: {0}")]
    Unavailable(String),

    #[error("compose request rejected: {0}")]
    Rejected(String),
}
