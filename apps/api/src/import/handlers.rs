use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use super::orchestrator::SessionStatus;
use super::session::ProgressEvent;
use super::{FileUpload, ImportError, ImportOrchestrator, LoadReport, ParseOptions};
use crate::document::{resolve_file_type, FileType};
use crate::errors::AppError;
use crate::models::resume::CanonicalResume;
use crate::state::AppState;

const FILE_FIELD: &str = "file";
const PROGRESS_POLL_TIMEOUT: Duration = Duration::from_secs(25);

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<ImportOrchestrator>, AppError> {
    state
        .sessions
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Import session {id} not found")))
}

/// POST /api/v1/import/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionStatus>), AppError> {
    let session = Arc::new(ImportOrchestrator::new(
        state.import,
        state.extractor.clone(),
    ));
    let status = session.status();
    state.sessions.write().await.insert(session.id(), session);
    info!(session_id = %status.session_id, "Import session created");
    Ok((StatusCode::CREATED, Json(status)))
}

/// GET /api/v1/import/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.status()))
}

/// DELETE /api/v1/import/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Import session {id} not found")))?;
    session.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/import/sessions/:id/reset
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatus>, AppError> {
    let session = find_session(&state, id).await?;
    session.reset();
    Ok(Json(session.status()))
}

/// POST /api/v1/import/sessions/:id/document
/// Multipart upload; the resume goes in the `file` field.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<LoadReport>, AppError> {
    let session = find_session(&state, id).await?;
    let limit_mb = state.import.max_file_mb();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        // Refuse unsupported types before buffering the body.
        if resolve_file_type(&file_name) == FileType::Unknown {
            return Err(ImportError::InvalidFileType { file_name }.into());
        }
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit_mb))?;

        let report = session
            .load(FileUpload {
                file_name,
                content_type,
                bytes,
            })
            .await?;
        return Ok(Json(report));
    }

    Err(AppError::Validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// POST /api/v1/import/sessions/:id/parse
/// Body is optional; when present it must be `ParseOptions` JSON.
pub async fn handle_parse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<CanonicalResume>, AppError> {
    let session = find_session(&state, id).await?;
    let options = parse_options(&body)?;
    let resume = session.parse(options).await?;
    Ok(Json(resume))
}

/// GET /api/v1/import/sessions/:id/progress
/// Long-poll: answers with the next progress event, or with the current one
/// once the poll times out. `null` means no phase is running.
pub async fn handle_poll_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<ProgressEvent>>, AppError> {
    let session = find_session(&state, id).await?;
    let mut progress = session.subscribe_progress();
    // Timeout and a closed channel both just mean "reply with what we have".
    let _ = tokio::time::timeout(PROGRESS_POLL_TIMEOUT, progress.changed()).await;
    let event = *progress.borrow();
    Ok(Json(event))
}

fn parse_options(body: &[u8]) -> Result<ParseOptions, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ParseOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid parse options: {e}")))
}

/// Body-limit rejections surface as the same error as an oversize file.
fn multipart_error(err: MultipartError, limit_mb: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Import(ImportError::FileTooLarge { limit_mb })
    } else {
        AppError::Validation(err.body_text())
    }
}
