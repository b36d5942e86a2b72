//! Link artifact: upload the clip (and a preview card) and compose a
//! self-describing share URL.

use super::card::{encode_png, CardPainter};
use crate::profile::Profile;
use crate::recorder::Recording;
use crate::storage::StorageGateway;
use anyhow::{Context, Result};
use chrono::Utc;
use image::RgbaImage;
use tracing::{info, warn};
use url::Url;

/// Route serving the share-preview HTML for audio clips.
pub const AUDIO_PREVIEW_ROUTE: &str = "api/audio/preview";

/// A composed share link. Immutable once generated: any client, in any
/// session, resolves it to the same audio/preview without server-side state.
#[derive(Debug, Clone)]
pub struct LinkArtifact {
    pub share_url: Url,
    pub audio_url: String,
    pub preview_url: Option<String>,
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or("");
    match essence {
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        "audio/webm" => "webm",
        "audio/mp4" => "m4a",
        _ => "wav",
    }
}

/// Upload the recording and compose the shareable URL.
///
/// The preview image is best-effort: its upload failure downgrades the link
/// (the preview endpoint substitutes a placeholder) but never fails the
/// pipeline. The preview upload is sequenced strictly after the audio upload
/// because the final URL embeds both.
pub async fn render_link(
    storage: &dyn StorageGateway,
    recording: &Recording,
    profile: &Profile,
    origin: &str,
    avatar: Option<RgbaImage>,
) -> Result<LinkArtifact> {
    let timestamp = Utc::now().timestamp_millis();

    let audio_name = format!(
        "voice-{}.{}",
        timestamp,
        extension_for_mime(&recording.mime_type)
    );
    let audio_url = storage
        .upload(&recording.bytes, &audio_name, &recording.mime_type)
        .await
        .context("Audio upload failed")?;

    let preview_url = match render_preview_bytes(avatar) {
        Ok(png) => {
            let preview_name = format!("preview-{}.png", timestamp);
            match storage.upload(&png, &preview_name, "image/png").await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Preview image upload failed, continuing without: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            warn!("Preview image render failed, continuing without: {}", e);
            None
        }
    };

    let share_url = compose_share_url(origin, timestamp, &audio_url, preview_url.as_deref(), profile)?;

    info!("Share link ready: {}", share_url);

    Ok(LinkArtifact {
        share_url,
        audio_url,
        preview_url,
    })
}

fn render_preview_bytes(avatar: Option<RgbaImage>) -> Result<Vec<u8>> {
    let card = CardPainter::new(avatar).render_preview_card();
    encode_png(&card)
}

/// Compose the share URL. Optional fields are omitted entirely, never
/// emitted as empty values.
pub fn compose_share_url(
    origin: &str,
    timestamp: i64,
    audio_url: &str,
    preview_url: Option<&str>,
    profile: &Profile,
) -> Result<Url> {
    let base = format!(
        "{}/{}/{}",
        origin.trim_end_matches('/'),
        AUDIO_PREVIEW_ROUTE,
        timestamp
    );
    let mut url = Url::parse(&base).context("Invalid app origin")?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("audio", audio_url);
        if let Some(preview) = preview_url {
            query.append_pair("preview", preview);
        }
        if let Some(avatar) = &profile.avatar_url {
            query.append_pair("avatar", avatar);
        }
        if let Some(name) = &profile.display_name {
            query.append_pair("name", name);
        }
        if let Some(username) = &profile.username {
            query.append_pair("username", username);
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn audio_param_round_trips() {
        let audio = "https://store.example.com/storage/v1/object/public/b/voice-1.wav";
        let url = compose_share_url(
            "https://voicecaster.xyz",
            1,
            audio,
            Some("https://store.example.com/p.png"),
            &Profile::anonymous(),
        )
        .unwrap();

        let params = query_map(&url);
        assert_eq!(params.get("audio").map(String::as_str), Some(audio));
        assert!(url.path().ends_with("/api/audio/preview/1"));
    }

    #[test]
    fn optional_params_are_omitted_not_empty() {
        let profile = Profile {
            display_name: None,
            username: None,
            avatar_url: Some("https://x/a.png".into()),
        };
        let url =
            compose_share_url("https://voicecaster.xyz", 2, "https://x/v.wav", None, &profile)
                .unwrap();

        let params = query_map(&url);
        assert!(params.contains_key("audio"));
        assert!(params.contains_key("avatar"));
        assert!(!params.contains_key("name"));
        assert!(!params.contains_key("username"));
        assert!(!params.contains_key("preview"));
        assert!(!url.query().unwrap_or("").contains("name="));
    }

    #[test]
    fn full_profile_appears_in_query() {
        let profile = Profile {
            display_name: Some("Ada Lovelace".into()),
            username: Some("ada".into()),
            avatar_url: Some("https://x/a.png".into()),
        };
        let url =
            compose_share_url("https://voicecaster.xyz/", 3, "https://x/v.wav", None, &profile)
                .unwrap();

        let params = query_map(&url);
        assert_eq!(params.get("name").map(String::as_str), Some("Ada Lovelace"));
        assert_eq!(params.get("username").map(String::as_str), Some("ada"));
    }

    #[test]
    fn extension_tracks_mime_type() {
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("audio/ogg;codecs=opus"), "ogg");
        assert_eq!(extension_for_mime("audio/flac"), "flac");
    }
}
