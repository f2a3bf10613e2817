//! Storage error types for rmirec-storage.
//!
//! [`StorageError`] separates three families of failure that callers treat
//! differently:
//! - **framing** errors (a literal tag missing or wrong, truncated input,
//!   trailing bytes): the byte stream is not a call record at all;
//! - **corruption** errors: the frame is intact but an embedded block
//!   cannot be decoded;
//! - **state** errors: a caller asked a record for something its lifecycle
//!   does not allow.

use thiserror::Error;

use rmirec_core::CoreError;

/// Errors produced by codec, packer and sink operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A literal tag did not match the expected value at its position.
    #[error("invalid record framing: expected tag '{expected}', found '{found}'")]
    Format { expected: String, found: String },

    /// The input ended before a section was complete.
    #[error("truncated record: {section} needs {needed} byte(s) but only {remaining} remain")]
    Truncated {
        section: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// Bytes remain after the trailer tag.
    #[error("invalid record framing: {count} trailing byte(s) after end tag")]
    TrailingBytes { count: usize },

    /// A framed block could not be decoded.
    #[error("corrupt {section}: {reason}")]
    Corrupt { section: &'static str, reason: String },

    /// The packed argument block carries an unknown encoding version.
    #[error("unsupported argument encoding version {0}")]
    UnsupportedPackVersion(u8),

    /// A value could not be encoded.
    #[error("encoding error: {0}")]
    Encode(String),

    /// The record's lifecycle does not allow the requested operation.
    #[error("invalid record state: {0}")]
    State(String),

    /// `complete` or `complete_with_failure` was called twice.
    #[error("call record for '{method}' is already completed")]
    AlreadyCompleted { method: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An artifact with the given id was not found.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Error from the value model.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from the SQLite database.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// True for errors meaning the input is not a well-framed record.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            StorageError::Format { .. }
                | StorageError::Truncated { .. }
                | StorageError::TrailingBytes { .. }
        )
    }

    /// True for errors meaning a well-framed block failed to decode.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StorageError::Corrupt { .. } | StorageError::UnsupportedPackVersion(_)
        )
    }
}
