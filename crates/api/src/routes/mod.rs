pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the render route tree.
///
/// ```text
/// /generate                  POST  render an image, 302 to /images/{id}.png
/// /images/{filename}         GET   stream a rendered artifact
/// ```
pub fn render_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(handlers::generation::generate))
        .route("/images/{filename}", get(handlers::images::get_image))
}
