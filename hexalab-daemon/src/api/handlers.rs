//! Route handlers for the scan API.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use hexalab_core::types::ScanStatus;

use super::AppState;
use super::error::ApiError;
use super::models::{ScanQueued, ScanReport, ScanRequest};
use super::upload::{persist_upload, sanitize_file_name};
use crate::health::DaemonHealth;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// `POST /scan`
pub async fn submit_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanQueued>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let job_id = state.queue.enqueue(request.target_files).await?;
    Ok(Json(ScanQueued::new(job_id)))
}

/// `POST /scan/upload`
///
/// Stores the `file` field under the upload directory, then submits it
/// exactly like `POST /scan` with a single path.
pub async fn upload_scan(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ScanQueued>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut stored = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let raw_name = field.file_name().map(str::to_owned).ok_or_else(|| {
            ApiError::BadRequest(format!("field '{UPLOAD_FIELD}' has no file name"))
        })?;
        let file_name = sanitize_file_name(&raw_name)?;
        let contents = field.bytes().await.map_err(multipart_error)?;
        stored = Some(persist_upload(&state.upload_dir, &file_name, contents).await?);
        break;
    }

    let path = stored.ok_or_else(|| {
        ApiError::BadRequest(format!("missing multipart field '{UPLOAD_FIELD}'"))
    })?;

    match state
        .queue
        .enqueue(vec![path.to_string_lossy().into_owned()])
        .await
    {
        Ok(job_id) => Ok(Json(ScanQueued::new(job_id))),
        Err(e) => {
            if let Some(folder) = path.parent()
                && let Err(cleanup) = tokio::fs::remove_dir_all(folder).await
            {
                tracing::warn!(path = %folder.display(), error = %cleanup, "failed to remove rejected upload");
            }
            Err(e.into())
        }
    }
}

/// `GET /scan/{job_id}/status`
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ScanStatus>, ApiError> {
    Ok(Json(state.queue.get_status(&job_id).await?))
}

/// `GET /scan/{job_id}/report`
pub async fn get_report(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ScanReport>, ApiError> {
    let result = state.queue.get_result(&job_id).await?;
    Ok(Json(ScanReport::from_result(&job_id, result)))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<DaemonHealth>) {
    (StatusCode::OK, Json(state.health().await))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
