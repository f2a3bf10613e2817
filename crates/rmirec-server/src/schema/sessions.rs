//! Session request/response types.

use serde::{Deserialize, Serialize};

use rmirec_storage::ArtifactId;

use crate::session::{RecordingSession, SessionId};

/// Request body for `POST /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Identity of the remote object to record calls against.
    pub target: String,
}

/// A session as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub target: String,
    /// Number of calls recorded so far.
    pub recorded_calls: u32,
    /// Sampler ids generated so far, in call order.
    pub artifacts: Vec<ArtifactId>,
}

impl From<RecordingSession> for SessionView {
    fn from(session: RecordingSession) -> Self {
        SessionView {
            id: session.id,
            target: session.target,
            recorded_calls: session.next_index,
            artifacts: session.artifacts,
        }
    }
}

/// Response for `GET /sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}
