//! Share-preview HTTP surface.
//!
//! Routes consumed by social clients resolving a shared link:
//! - GET /api/audio/preview/:audio_id - audio preview page with OG/Frame tags
//! - GET /api/video/:video_id - video preview page
//! - POST /api/redirect - fixed redirect back into the app
//! - GET /health - health check

mod handlers;
mod routes;
mod state;
mod template;

pub use routes::create_router;
pub use state::AppState;
