pub mod artifact;
pub mod audio;
pub mod compose;
pub mod config;
pub mod error;
pub mod http;
pub mod profile;
pub mod recorder;
pub mod storage;

pub use artifact::{render_link, render_video, Artifact, LinkArtifact, VideoBlob};
pub use compose::{FarcasterClient, PublishState, Publisher};
pub use config::Config;
pub use http::{create_router, AppState};
pub use profile::Profile;
pub use recorder::{CaptureSession, RecorderConfig, Recording};
pub use storage::{ObjectStore, StorageGateway};
