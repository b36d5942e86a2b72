pub mod session;

pub use session::{CaptureSession, RecorderConfig, Recording};
