//! System clipboard access, used as the first manual fallback when the
//! native composer is unavailable.

use crate::error::ComposeError;
use async_trait::async_trait;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn set_text(&self, text: &str) -> Result<(), ComposeError>;
}

/// Clipboard backed by the OS clipboard. arboard is synchronous, so calls
/// run on the blocking pool.
pub struct SystemClipboard;

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn set_text(&self, text: &str) -> Result<(), ComposeError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| ComposeError::Unavailable(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| ComposeError::Rejected(e.to_string()))
        })
        .await
        .map_err(|e| ComposeError::Unavailable(e.to_string()))?
    }
}
