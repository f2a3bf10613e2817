//! Session management handlers (create, list, get, close).

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::schema::sessions::{CreateSessionRequest, SessionListResponse, SessionView};
use crate::session::SessionId;
use crate::state::AppState;

/// Opens a recording session.
///
/// `POST /sessions`
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    if req.target.trim().is_empty() {
        return Err(ApiError::BadRequest("target must not be empty".to_string()));
    }
    let id = state.sessions.create(req.target);
    tracing::info!(session = %id, "recording session opened");
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::InternalError(format!("session {} vanished", id)))?;
    Ok(Json(session.into()))
}

/// Lists open sessions.
///
/// `GET /sessions`
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state.sessions.list().into_iter().map(SessionView::from).collect();
    Json(SessionListResponse { sessions })
}

/// Returns one session.
///
/// `GET /sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state
        .sessions
        .get(&SessionId(id))
        .ok_or_else(|| ApiError::NotFound(format!("session {}", id)))?;
    Ok(Json(session.into()))
}

/// Closes a session. Artifacts already generated are kept.
///
/// `DELETE /sessions/{id}`
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.sessions.remove(&SessionId(id)) {
        return Err(ApiError::NotFound(format!("session {}", id)));
    }
    tracing::info!(session = %id, "recording session closed");
    Ok(Json(serde_json::json!({ "success": true })))
}
