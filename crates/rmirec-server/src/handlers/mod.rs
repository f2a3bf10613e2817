//! HTTP handler modules for the recording API.
//!
//! Handlers parse requests, consult the session registry, acquire the
//! service lock, delegate to [`RecordingService`](crate::service::RecordingService)
//! and return JSON responses.

pub mod artifacts;
pub mod records;
pub mod sessions;
