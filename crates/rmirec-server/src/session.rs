//! Recording sessions.
//!
//! A session records calls made against one remote target. It owns the
//! call index counter: each accepted record gets the next index, in arrival
//! order. [`SessionRegistry`] is backed by `DashMap` for concurrent access
//! from async handler tasks.

use std::time::Instant;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rmirec_storage::ArtifactId;

/// Unique session identifier (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open recording session.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: SessionId,
    /// Identity of the remote object calls are made against.
    pub target: String,
    /// Index the next accepted record will get.
    pub next_index: u32,
    /// Sampler ids generated so far, in call order.
    pub artifacts: Vec<ArtifactId>,
    pub created_at: Instant,
}

/// Registry of open sessions.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, RecordingSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
        }
    }

    /// Opens a session against `target`, returning its id.
    pub fn create(&self, target: impl Into<String>) -> SessionId {
        let id = SessionId(Uuid::new_v4());
        self.sessions.insert(
            id,
            RecordingSession {
                id,
                target: target.into(),
                next_index: 0,
                artifacts: Vec::new(),
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Returns a clone of the session, if it exists.
    pub fn get(&self, id: &SessionId) -> Option<RecordingSession> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// All open sessions, oldest first.
    pub fn list(&self) -> Vec<RecordingSession> {
        let mut sessions: Vec<RecordingSession> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Closes a session. Returns `true` if it was open.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Takes the next call index for a session, returning it with the
    /// session's target.
    pub fn allocate_index(&self, id: &SessionId) -> Option<(u32, String)> {
        let mut entry = self.sessions.get_mut(id)?;
        let index = entry.next_index;
        entry.next_index += 1;
        Some((index, entry.target.clone()))
    }

    /// Appends a generated sampler id to the session's history.
    pub fn push_artifact(&self, id: &SessionId, artifact: ArtifactId) {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            entry.artifacts.push(artifact);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_are_sequential_per_session() {
        let registry = SessionRegistry::new();
        let a = registry.create("Broker");
        let b = registry.create("Files");

        assert_eq!(registry.allocate_index(&a), Some((0, "Broker".to_string())));
        assert_eq!(registry.allocate_index(&a), Some((1, "Broker".to_string())));
        assert_eq!(registry.allocate_index(&b), Some((0, "Files".to_string())));
        assert_eq!(registry.get(&a).unwrap().next_index, 2);
    }

    #[test]
    fn unknown_session() {
        let registry = SessionRegistry::new();
        let id = SessionId(Uuid::new_v4());
        assert!(registry.get(&id).is_none());
        assert!(registry.allocate_index(&id).is_none());
        assert!(!registry.remove(&id));
    }

    #[test]
    fn artifacts_are_kept_in_order() {
        let registry = SessionRegistry::new();
        let id = registry.create("Broker");
        registry.push_artifact(&id, ArtifactId("one".to_string()));
        registry.push_artifact(&id, ArtifactId("two".to_string()));
        let session = registry.get(&id).unwrap();
        assert_eq!(
            session.artifacts,
            vec![ArtifactId("one".to_string()), ArtifactId("two".to_string())]
        );
        assert!(registry.remove(&id));
        assert!(registry.list().is_empty());
    }
}
