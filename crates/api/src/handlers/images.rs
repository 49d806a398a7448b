//! Handler for `GET /images/{filename}`.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderValue};
use axum::response::{IntoResponse, Response};
use imagegen_core::job::JobId;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const PNG_CONTENT_TYPE: &str = "image/png";

/// GET /images/{filename}
///
/// Streams a previously rendered artifact. Only names of the form
/// `<job-id>.png` are looked up; anything else is a 404, which keeps the
/// lookup confined to the output directory.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let job_id = JobId::from_file_name(&filename).ok_or_else(image_not_found)?;
    let path = state.dispatcher.config().output_dir.join(job_id.file_name());

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(image_not_found()),
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };
    let file_size = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();

    let stream = ReaderStream::new(file);

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PNG_CONTENT_TYPE)),
            (header::CONTENT_LENGTH, HeaderValue::from(file_size)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

fn image_not_found() -> AppError {
    AppError::NotFound("Image not found".to_string())
}
