//! Handler for `POST /generate`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use imagegen_core::request::GenerationRequest;

use crate::error::{AppError, AppResult};
use crate::response;
use crate::state::AppState;

/// POST /generate
///
/// Validates the request, runs one render through the dispatcher, and
/// redirects to the artifact on success.
///
/// The dispatch runs in its own task: once a render is admitted it runs to
/// completion (or timeout) even if the client disconnects or the HTTP
/// timeout fires, and the slot is released by that task.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let params = request.into_params()?;

    let dispatcher = Arc::clone(&state.dispatcher);
    let outcome = tokio::spawn(async move { dispatcher.dispatch(params).await })
        .await
        .map_err(|e| AppError::InternalError(format!("render task failed: {e}")))?;

    response::outcome_response(outcome)
}
