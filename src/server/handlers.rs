//! Request handlers for the REST API.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{AppState, UPLOAD_SUBDIR};
use crate::pipeline::{CombinedResult, PipelineError};
use crate::vision::models::ModelStatus;

/// Errors surfaced to API clients as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        if err.is_input_error() {
            ServerError::Unprocessable(err.to_string())
        } else {
            ServerError::Internal(err.to_string())
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("Failed to store upload: {err}"))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        } else {
            debug!("Rejected request: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models: Vec<ModelStatus>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        models: state.models.as_ref().clone(),
    })
}

/// POST /predict - multipart upload, field `file`
///
/// The upload is kept under `<output_dir>/api_uploads/` and the combined
/// result returned as JSON.
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CombinedResult>, ServerError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {e}")))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| ServerError::BadRequest("Missing multipart field 'file'".to_string()))?;

    let path = state
        .outputs
        .save_upload(UPLOAD_SUBDIR, file_name.as_deref(), &bytes)?;
    debug!("Upload {:?} stored at {:?}", file_name, path);

    // Inference is CPU bound; requests queue on the engine lock
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.lock().predict(&path))
        .await
        .map_err(|e| ServerError::Internal(format!("Prediction task failed: {e}")))??;

    Ok(Json(result))
}
