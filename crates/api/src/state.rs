use std::sync::Arc;

use imagegen_render::JobDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Render dispatcher. Owns the admission gate and the render config.
    pub dispatcher: Arc<JobDispatcher>,
}
