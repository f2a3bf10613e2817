//! Artifact query handlers.

use axum::extract::{Path, State};
use axum::Json;

use rmirec_storage::{ArtifactId, StoredArtifact};

use crate::error::ApiError;
use crate::schema::artifacts::ArtifactListResponse;
use crate::state::AppState;

/// Lists persisted artifacts in call order.
///
/// `GET /artifacts`
pub async fn list_artifacts(
    State(state): State<AppState>,
) -> Result<Json<ArtifactListResponse>, ApiError> {
    let service = state.service.lock().await;
    let artifacts = service.list_artifacts()?;
    Ok(Json(ArtifactListResponse { artifacts }))
}

/// Returns one artifact with its post-processor, if any.
///
/// `GET /artifacts/{id}`
pub async fn get_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredArtifact>, ApiError> {
    let service = state.service.lock().await;
    let artifact = service.get_artifact(&ArtifactId(id))?;
    Ok(Json(artifact))
}
