//! Storage gateway client.
//!
//! Uploads are non-overwriting and keyed by timestamp-derived filenames, so
//! objects are effectively immutable once written. The gateway itself is an
//! external collaborator; this module is a thin, well-typed client over it.

use crate::config::StorageConfig;
use crate::error::UploadError;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// Object storage collaborator: binary in, public URL out.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

/// HTTP client for a Supabase-style object store.
pub struct ObjectStore {
    base_url: String,
    bucket: String,
    api_key: String,
    cache_max_age_secs: u64,
    client: reqwest::Client,
}

impl ObjectStore {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            bucket: cfg.bucket.clone(),
            api_key: cfg.api_key.clone(),
            cache_max_age_secs: cfg.cache_max_age_secs,
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, filename
        )
    }

    /// Publicly retrievable URL for an uploaded object.
    pub fn public_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, filename
        )
    }
}

#[async_trait]
impl StorageGateway for ObjectStore {
    async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload(filename.to_string()));
        }

        info!("Uploading {} ({} bytes)", filename, bytes.len());

        let response = self
            .client
            .post(self.object_url(filename))
            .bearer_auth(&self.api_key)
            .header("content-type", content_type)
            .header(
                "cache-control",
                format!("max-age={}", self.cache_max_age_secs),
            )
            // Never overwrite: filenames are timestamp-namespaced.
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(UploadError::Rejected {
                filename: filename.to_string(),
                reason: format!("HTTP {}: {}", status, reason),
            });
        }

        let url = self.public_url(filename);
        info!("Upload complete: {}", url);
        Ok(url)
    }
}

/// Timestamp-namespaced object name, e.g. `voice-1714680000000.wav`.
pub fn timestamped_name(prefix: &str, extension: &str) -> String {
    format!("{}-{}.{}", prefix, Utc::now().timestamp_millis(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ObjectStore {
        ObjectStore::new(&StorageConfig {
            base_url: "https://storage.example.com/".into(),
            bucket: "voice-recordings".into(),
            api_key: "key".into(),
            cache_max_age_secs: 3600,
        })
    }

    #[test]
    fn public_url_shape() {
        assert_eq!(
            store().public_url("voice-1.wav"),
            "https://storage.example.com/storage/v1/object/public/voice-recordings/voice-1.wav"
        );
    }

    #[test]
    fn object_url_strips_trailing_slash() {
        assert_eq!(
            store().object_url("a.png"),
            "https://storage.example.com/storage/v1/object/voice-recordings/a.png"
        );
    }

    #[test]
    fn timestamped_names_carry_prefix_and_extension() {
        let name = timestamped_name("voice", "wav");
        assert!(name.starts_with("voice-"));
        assert!(name.ends_with(".wav"));
    }

    #[tokio::test]
    async fn empty_payload_rejected_without_network() {
        let result = store().upload(&[], "voice-1.wav", "audio/wav").await;
        assert!(matches!(result, Err(UploadError::EmptyPayload(_))));
    }
}
