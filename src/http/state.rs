use crate::config::Config;
use std::sync::Arc;

/// Shared application state for HTTP handlers. The preview routes are
/// stateless by design, so this carries configuration only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
