use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imagegen_core::error::{CoreError, RenderError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`RenderError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `imagegen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A render job that did not produce an artifact.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Message for every server-side render failure. Exit codes and paths are
/// logged, never returned.
const RENDER_FAILED_MESSAGE: &str = "Image generation failed";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }

            // --- Render outcomes ---
            AppError::Render(render) => classify_render_error(render),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_error()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a render failure to its HTTP status, error code, and public message.
///
/// - Admission denied maps to 429 and states the capacity.
/// - Timeout maps to 408.
/// - Process failure and missing artifact map to 500 with a generic message.
fn classify_render_error(err: &RenderError) -> (StatusCode, &'static str, String) {
    match err {
        RenderError::AdmissionDenied { capacity } => (
            StatusCode::TOO_MANY_REQUESTS,
            "BUSY",
            format!("Server busy: all {capacity} render slots are in use, retry later"),
        ),
        RenderError::ExecutionTimeout => (
            StatusCode::REQUEST_TIMEOUT,
            "RENDER_TIMEOUT",
            "Image generation timed out".to_string(),
        ),
        RenderError::ExecutionFailed { exit_code } => {
            tracing::error!(exit_code = ?exit_code, "Render process failed");
            render_failed()
        }
        RenderError::ArtifactMissing => {
            tracing::error!("Render produced no output file");
            render_failed()
        }
    }
}

fn render_failed() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "RENDER_FAILED",
        RENDER_FAILED_MESSAGE.to_string(),
    )
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
