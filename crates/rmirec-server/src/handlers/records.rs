//! Call record ingestion.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::schema::records::{RecordQuery, RecordResponse};
use crate::service::RecordingService;
use crate::session::SessionId;
use crate::state::AppState;

/// Accepts one packed call record, generates its artifacts and persists them.
///
/// The record gets the session's next call index. Records that fail to
/// decode do not consume an index.
///
/// `POST /sessions/{id}/records?remote_prefix=...`
pub async fn record_call(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecordQuery>,
    body: Bytes,
) -> Result<Json<RecordResponse>, ApiError> {
    let session_id = SessionId(id);
    if state.sessions.get(&session_id).is_none() {
        return Err(ApiError::NotFound(format!("session {}", id)));
    }

    let record = RecordingService::decode(&body)?;
    let (index, target) = state
        .sessions
        .allocate_index(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("session {}", id)))?;
    let record = record
        .with_origin(index, target)
        .with_scope(session_id.to_string());

    let artifacts = {
        let mut service = state.service.lock().await;
        service.record(record, query.remote_prefix.as_deref())?
    };
    state
        .sessions
        .push_artifact(&session_id, artifacts.sampler.id.clone());

    Ok(Json(RecordResponse {
        session_id,
        index,
        sampler: artifacts.sampler,
        post_processor: artifacts.post_processor,
    }))
}
