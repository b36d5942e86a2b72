//! Host-platform compose integration.
//!
//! The client talks to the host's SDK bridge over HTTP. Every call is
//! best-effort: the publisher degrades to manual fallbacks when the bridge
//! is absent or refuses a request.

use crate::error::ComposeError;
use crate::profile::Profile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Native share/compose surface exposed by the host platform.
#[async_trait]
pub trait ComposeSdk: Send + Sync {
    /// Whether the host bridge is reachable and initialized.
    async fn ready(&self) -> bool;

    /// Fetch the viewer profile snapshot.
    async fn context(&self) -> Result<Profile, ComposeError>;

    /// Open the native composer prefilled with text and embedded URLs.
    async fn compose_cast(&self, text: &str, embeds: &[String]) -> Result<(), ComposeError>;

    /// Hand a file to the native share sheet.
    async fn share_file(&self, filename: &str, title: &str, bytes: &[u8])
        -> Result<(), ComposeError>;
}

#[derive(Debug, Serialize)]
struct ComposeCastRequest<'a> {
    text: &'a str,
    embeds: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ContextResponse {
    #[serde(default)]
    user: Profile,
}

/// HTTP client for the Farcaster mini-app bridge.
pub struct FarcasterClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FarcasterClient {
    pub fn new(endpoint: &str) -> Result<Self, ComposeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ComposeError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }
}

#[async_trait]
impl ComposeSdk for FarcasterClient {
    async fn ready(&self) -> bool {
        match self.client.get(self.url("ready")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Compose bridge not ready: {}", e);
                false
            }
        }
    }

    async fn context(&self) -> Result<Profile, ComposeError> {
        let resp = self
            .client
            .get(self.url("context"))
            .send()
            .await
            .map_err(|e| ComposeError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ComposeError::Rejected(format!(
                "context returned {}",
                resp.status()
            )));
        }

        let body: ContextResponse = resp
            .json()
            .await
            .map_err(|e| ComposeError::Rejected(e.to_string()))?;

        Ok(body.user)
    }

    async fn compose_cast(&self, text: &str, embeds: &[String]) -> Result<(), ComposeError> {
        let resp = self
            .client
            .post(self.url("compose-cast"))
            .json(&ComposeCastRequest { text, embeds })
            .send()
            .await
            .map_err(|e| ComposeError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ComposeError::Rejected(format!(
                "compose-cast returned {}",
                resp.status()
            )));
        }

        Ok(())
    }

    async fn share_file(
        &self,
        filename: &str,
        title: &str,
        bytes: &[u8],
    ) -> Result<(), ComposeError> {
        let resp = self
            .client
            .post(self.url("share-file"))
            .query(&[("filename", filename), ("title", title)])
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ComposeError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ComposeError::Rejected(format!(
                "share-file returned {}",
                resp.status()
            )));
        }

        Ok(())
    }
}
