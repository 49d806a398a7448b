//! Mapping of render outcomes to HTTP responses.
//!
//! A successful render answers `302 Found` pointing at
//! `GET /images/<job-id>.png`; the artifact is always addressed by its job
//! id, never by anything derived from the prompt. Failures go through
//! [`AppError`] and become JSON error bodies.

use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imagegen_core::job::JobId;
use imagegen_core::outcome::RenderOutcome;

use crate::error::AppResult;

/// Path under which artifacts are served.
pub const IMAGES_PATH: &str = "/images";

/// External URL of the artifact produced by `job_id`.
pub fn artifact_url(job_id: &JobId) -> String {
    format!("{IMAGES_PATH}/{}", job_id.file_name())
}

/// Turn a dispatcher outcome into the `POST /generate` response.
pub fn outcome_response(outcome: RenderOutcome) -> AppResult<Response> {
    let image = outcome.into_result()?;
    Ok((StatusCode::FOUND, [(LOCATION, artifact_url(&image.job_id))]).into_response())
}
