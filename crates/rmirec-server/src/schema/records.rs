//! Call record request/response types.

use serde::{Deserialize, Serialize};

use rmirec_storage::{PostProcessorArtifact, SamplerArtifact};

use crate::session::SessionId;

/// Query parameters for `POST /sessions/{id}/records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Scan the return value for remote references, naming them with this
    /// prefix.
    pub remote_prefix: Option<String>,
}

/// Artifacts generated for one posted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub session_id: SessionId,
    /// Index assigned to the call within its session.
    pub index: u32,
    pub sampler: SamplerArtifact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_processor: Option<PostProcessorArtifact>,
}
