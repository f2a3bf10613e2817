//! Artifact response types.

use serde::{Deserialize, Serialize};

use rmirec_storage::ArtifactSummary;

/// Response for `GET /artifacts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactListResponse {
    pub artifacts: Vec<ArtifactSummary>,
}
