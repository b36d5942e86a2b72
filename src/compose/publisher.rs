//! Publishing state machine with degraded fallbacks.
//!
//! Each artifact kind has an ordered chain of delivery paths. The publisher
//! walks the chain until one succeeds; success through anything but the
//! native path is reported as `Degraded` so the caller can tell the user
//! what actually happened.

use crate::artifact::Artifact;
use crate::compose::clipboard::Clipboard;
use crate::compose::sdk::ComposeSdk;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Which manual path delivered the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Share URL copied to the system clipboard.
    ClipboardCopy,
    /// Share URL surfaced as plain text for the user to copy by hand.
    RawUrl,
    /// Video written to the local download directory.
    FileDownload,
}

/// Outcome of one publish attempt. Transitions only move forward:
/// `InProgress` never reappears once a terminal state is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    InProgress,
    /// Delivered through the native composer or share sheet.
    Succeeded,
    /// Delivered, but through a manual fallback the user must act on.
    Degraded(Fallback),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PublishReport {
    pub state: PublishState,
    /// Message to surface to the user (fallback instructions, error text).
    pub detail: Option<String>,
}

pub struct Publisher {
    sdk: Box<dyn ComposeSdk>,
    clipboard: Box<dyn Clipboard>,
    download_dir: PathBuf,
}

impl Publisher {
    pub fn new(
        sdk: Box<dyn ComposeSdk>,
        clipboard: Box<dyn Clipboard>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            sdk,
            clipboard,
            download_dir,
        }
    }

    pub async fn publish(&self, artifact: &Artifact, text: &str) -> PublishReport {
        match artifact {
            Artifact::Link(link) => self.publish_link(link.share_url.as_str(), text).await,
            Artifact::Video(video) => self.publish_video(&video.bytes, &video.mime_type, text).await,
        }
    }

    /// Link chain: native composer, then clipboard, then the raw URL.
    /// A link always reaches the user one way or another.
    async fn publish_link(&self, share_url: &str, text: &str) -> PublishReport {
        if self.sdk.ready().await {
            match self
                .sdk
                .compose_cast(text, &[share_url.to_string()])
                .await
            {
                Ok(()) => {
                    info!("Published via native composer");
                    return PublishReport {
                        state: PublishState::Succeeded,
                        detail: None,
                    };
                }
                Err(e) => warn!("Native composer failed: {}", e),
            }
        } else {
            warn!("Compose bridge not ready; falling back");
        }

        match self.clipboard.set_text(share_url).await {
            Ok(()) => {
                info!("Share URL copied to clipboard");
                PublishReport {
                    state: PublishState::Degraded(Fallback::ClipboardCopy),
                    detail: Some("Link copied to clipboard. Paste it anywhere to share.".into()),
                }
            }
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                PublishReport {
                    state: PublishState::Degraded(Fallback::RawUrl),
                    detail: Some(format!("Copy this link to share: {}", share_url)),
                }
            }
        }
    }

    /// Video chain: native share sheet, then a local file download. Unlike
    /// the link chain this can fail outright.
    async fn publish_video(&self, bytes: &[u8], mime_type: &str, text: &str) -> PublishReport {
        let extension = match mime_type {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            _ => "avi",
        };
        let filename = format!("voice-video-{}.{}", Utc::now().timestamp_millis(), extension);

        if self.sdk.ready().await {
            match self.sdk.share_file(&filename, text, bytes).await {
                Ok(()) => {
                    info!("Video handed to native share sheet");
                    return PublishReport {
                        state: PublishState::Succeeded,
                        detail: None,
                    };
                }
                Err(e) => warn!("Native share failed: {}", e),
            }
        } else {
            warn!("Compose bridge not ready; falling back to download");
        }

        // The directory may not exist on a fresh install.
        let path = self.download_dir.join(&filename);
        let write_result = match tokio::fs::create_dir_all(&self.download_dir).await {
            Ok(()) => tokio::fs::write(&path, bytes).await,
            Err(e) => Err(e),
        };
        match write_result {
            Ok(()) => {
                info!("Video saved to {}", path.display());
                PublishReport {
                    state: PublishState::Degraded(Fallback::FileDownload),
                    detail: Some(format!(
                        "Video saved to {}. Embedded viewers may block downloads; open in a full browser if it did not appear.",
                        path.display()
                    )),
                }
            }
            Err(e) => {
                warn!("Video download fallback failed: {}", e);
                PublishReport {
                    state: PublishState::Failed(e.to_string()),
                    detail: Some(format!("Could not deliver the video: {}", e)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{LinkArtifact, VideoBlob};
    use crate::error::ComposeError;
    use crate::profile::Profile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use url::Url;

    struct FakeSdk {
        ready: bool,
        compose_ok: bool,
        share_ok: bool,
        composed: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl FakeSdk {
        fn new(ready: bool, compose_ok: bool, share_ok: bool) -> Self {
            Self {
                ready,
                compose_ok,
                share_ok,
                composed: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ComposeSdk for FakeSdk {
        async fn ready(&self) -> bool {
            self.ready
        }

        async fn context(&self) -> Result<Profile, ComposeError> {
            Ok(Profile::anonymous())
        }

        async fn compose_cast(&self, _text: &str, embeds: &[String]) -> Result<(), ComposeError> {
            if self.compose_ok {
                self.composed.lock().unwrap().push(embeds.to_vec());
                Ok(())
            } else {
                Err(ComposeError::Rejected("composer closed".into()))
            }
        }

        async fn share_file(
            &self,
            _filename: &str,
            _title: &str,
            _bytes: &[u8],
        ) -> Result<(), ComposeError> {
            if self.share_ok {
                Ok(())
            } else {
                Err(ComposeError::Rejected("share sheet dismissed".into()))
            }
        }
    }

    struct FakeClipboard {
        works: bool,
        copied: Arc<Mutex<Option<String>>>,
        used: Arc<AtomicBool>,
    }

    impl FakeClipboard {
        fn new(works: bool) -> Self {
            Self {
                works,
                copied: Arc::new(Mutex::new(None)),
                used: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl Clipboard for FakeClipboard {
        async fn set_text(&self, text: &str) -> Result<(), ComposeError> {
            self.used.store(true, Ordering::SeqCst);
            if self.works {
                *self.copied.lock().unwrap() = Some(text.to_string());
                Ok(())
            } else {
                Err(ComposeError::Unavailable("no clipboard".into()))
            }
        }
    }

    fn link_artifact() -> Artifact {
        Artifact::Link(LinkArtifact {
            share_url: Url::parse("https://voicecaster.xyz/api/audio/preview/1?audio=x").unwrap(),
            audio_url: "https://store/voice-1.wav".into(),
            preview_url: None,
        })
    }

    fn video_artifact() -> Artifact {
        Artifact::Video(VideoBlob {
            bytes: vec![1, 2, 3, 4],
            mime_type: "video/x-msvideo".into(),
        })
    }

    #[tokio::test]
    async fn link_publishes_natively_when_sdk_works() {
        let sdk = FakeSdk::new(true, true, true);
        let composed = sdk.composed.clone();
        let clipboard = FakeClipboard::new(true);
        let used = clipboard.used.clone();

        let publisher = Publisher::new(Box::new(sdk), Box::new(clipboard), PathBuf::from("/tmp"));
        let report = publisher.publish(&link_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Succeeded);
        assert_eq!(composed.lock().unwrap().len(), 1);
        assert!(!used.load(Ordering::SeqCst), "clipboard must stay untouched");
    }

    #[tokio::test]
    async fn link_degrades_to_clipboard_when_composer_fails() {
        let sdk = FakeSdk::new(true, false, true);
        let clipboard = FakeClipboard::new(true);
        let copied = clipboard.copied.clone();

        let publisher = Publisher::new(Box::new(sdk), Box::new(clipboard), PathBuf::from("/tmp"));
        let report = publisher.publish(&link_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Degraded(Fallback::ClipboardCopy));
        assert!(copied.lock().unwrap().as_deref().unwrap().contains("audio="));
    }

    #[tokio::test]
    async fn link_degrades_to_raw_url_when_everything_fails() {
        let sdk = FakeSdk::new(false, false, false);
        let clipboard = FakeClipboard::new(false);

        let publisher = Publisher::new(Box::new(sdk), Box::new(clipboard), PathBuf::from("/tmp"));
        let report = publisher.publish(&link_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Degraded(Fallback::RawUrl));
        assert!(report.detail.unwrap().contains("https://voicecaster.xyz"));
    }

    #[tokio::test]
    async fn video_falls_back_to_download() {
        let dir = tempfile::tempdir().unwrap();
        let sdk = FakeSdk::new(false, false, false);
        let clipboard = FakeClipboard::new(true);

        let publisher = Publisher::new(
            Box::new(sdk),
            Box::new(clipboard),
            dir.path().to_path_buf(),
        );
        let report = publisher.publish(&video_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Degraded(Fallback::FileDownload));
        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }

    #[tokio::test]
    async fn video_fallback_creates_a_missing_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let download_dir = dir.path().join("nested").join("downloads");
        let sdk = FakeSdk::new(false, false, false);
        let clipboard = FakeClipboard::new(true);

        let publisher = Publisher::new(Box::new(sdk), Box::new(clipboard), download_dir.clone());
        let report = publisher.publish(&video_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Degraded(Fallback::FileDownload));
        let saved: Vec<_> = std::fs::read_dir(&download_dir).unwrap().collect();
        assert_eq!(saved.len(), 1);
    }

    #[tokio::test]
    async fn video_fails_when_download_dir_is_unwritable() {
        // A path under a regular file cannot be created.
        let file = tempfile::NamedTempFile::new().unwrap();
        let sdk = FakeSdk::new(false, false, false);
        let clipboard = FakeClipboard::new(true);

        let publisher = Publisher::new(
            Box::new(sdk),
            Box::new(clipboard),
            file.path().join("downloads"),
        );
        let report = publisher.publish(&video_artifact(), "hi").await;

        assert!(matches!(report.state, PublishState::Failed(_)));
    }

    #[tokio::test]
    async fn video_shares_natively_when_available() {
        let sdk = FakeSdk::new(true, true, true);
        let clipboard = FakeClipboard::new(true);

        let publisher = Publisher::new(Box::new(sdk), Box::new(clipboard), PathBuf::from("/tmp"));
        let report = publisher.publish(&video_artifact(), "hi").await;

        assert_eq!(report.state, PublishState::Succeeded);
    }
}
