use crate::config::Config;

/// Shared application state injected into route handlers via Axum extractors.
///
/// Read-only after startup: the config and the HTTP connection pool are the
/// only process-wide values. Each request builds its own pipeline state on
/// top of these; nothing mutable is shared between concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}
