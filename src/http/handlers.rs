use super::state::AppState;
use super::template::{AudioPage, VideoPage};
use axum::{
    extract::{Host, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::form_urlencoded;

/// Preview pages are immutable for a given query string, so crawlers may
/// cache them for a day.
const CACHE_CONTROL_VALUE: &str = "public, max-age=86400";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AudioPreviewParams {
    pub audio: Option<String>,
    pub preview: Option<String>,
    pub avatar: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoPreviewParams {
    pub video: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Reconstruct the canonical URL of this page from the request, re-encoding
/// only the parameters that were actually supplied.
fn wrapper_url(host: &str, path: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    format!("https://{}{}?{}", host, path, query.finish())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/audio/preview/:audio_id
/// Social-preview page for a shared audio clip.
pub async fn audio_preview(
    State(state): State<AppState>,
    Host(host): Host,
    Path(audio_id): Path<String>,
    Query(params): Query<AudioPreviewParams>,
) -> impl IntoResponse {
    let audio = match &params.audio {
        Some(audio) => audio,
        None => return bad_request("Audio URL required"),
    };

    info!("Serving audio preview for {}", audio_id);

    let wrapper = wrapper_url(
        &host,
        &format!("/api/audio/preview/{}", audio_id),
        &[
            ("audio", Some(audio.as_str())),
            ("preview", params.preview.as_deref()),
            ("avatar", params.avatar.as_deref()),
        ],
    );

    let html = AudioPage {
        wrapper_url: &wrapper,
        app_origin: &state.config.app.origin,
        audio_url: audio,
        preview_url: params.preview.as_deref(),
        avatar_url: params.avatar.as_deref(),
        display_name: params.name.as_deref(),
        username: params.username.as_deref(),
    }
    .render();

    (
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Html(html),
    )
        .into_response()
}

/// GET /api/video/:video_id
/// Social-preview page for a shared video clip.
pub async fn video_preview(
    State(state): State<AppState>,
    Host(host): Host,
    Path(video_id): Path<String>,
    Query(params): Query<VideoPreviewParams>,
) -> impl IntoResponse {
    let video = match &params.video {
        Some(video) => video,
        None => return bad_request("Video URL required"),
    };

    info!("Serving video preview for {}", video_id);

    let wrapper = wrapper_url(
        &host,
        &format!("/api/video/{}", video_id),
        &[("video", Some(video.as_str()))],
    );

    let html = VideoPage {
        wrapper_url: &wrapper,
        app_origin: &state.config.app.origin,
        video_url: video,
    }
    .render();

    (
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Html(html),
    )
        .into_response()
}

/// POST /api/redirect
/// Frame button callback: always bounces into the app. Non-POST methods are
/// rejected by the router with 405.
pub async fn redirect_to_app(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, state.config.app.redirect_target.clone())],
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
