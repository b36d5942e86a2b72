pub mod avi;
pub mod card;
pub mod link;
pub mod video;

pub use card::CardPainter;
pub use link::{render_link, LinkArtifact};
pub use video::{render_video, BuiltinEncoders, EncoderSupport, VideoBlob, VideoFormat};

/// A shareable artifact derived from one Recording.
#[derive(Debug, Clone)]
pub enum Artifact {
    Link(LinkArtifact),
    Video(VideoBlob),
}
