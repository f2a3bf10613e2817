//! Application state shared by all handlers.
//!
//! [`AppState`] wraps the [`RecordingService`] in `Arc<tokio::sync::Mutex<>>`
//! so handlers await the lock without blocking the tokio runtime. The
//! service holds a `rusqlite::Connection`, which is `!Sync`, so an `RwLock`
//! is not an option.

use std::sync::Arc;

use rmirec_codegen::RecorderOptions;

use crate::error::ApiError;
use crate::service::RecordingService;
use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    /// The shared recording service (async Mutex).
    pub service: Arc<tokio::sync::Mutex<RecordingService>>,
    /// Open recording sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Creates a new `AppState` persisting artifacts to the SQLite database
    /// at `db_path`.
    pub fn new(db_path: &str, options: RecorderOptions) -> Result<Self, ApiError> {
        let service = RecordingService::new(db_path, options)?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            sessions: Arc::new(SessionRegistry::new()),
        })
    }

    /// Creates a new `AppState` with an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        let service = RecordingService::in_memory(RecorderOptions::default())?;
        Ok(AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
            sessions: Arc::new(SessionRegistry::new()),
        })
    }
}
