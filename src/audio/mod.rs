pub mod backend;
pub mod decode;
pub mod encode;
pub mod microphone;

pub use backend::{AudioFrame, CaptureBackend, CaptureBackendFactory, CaptureConstraints};
pub use decode::{decode, DecodedAudio};
pub use encode::{select_encoding, AudioEncoding, BuiltinCodecs, CodecSupport, ENCODING_PREFERENCES};
pub use microphone::MicrophoneBackend;
