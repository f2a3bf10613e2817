//! RecordingService: the coordinator between HTTP handlers and the
//! recording pipeline and artifact store.

use rmirec_codegen::{annotate_remote_returns, GeneratedArtifacts, Recorder, RecorderOptions};
use rmirec_storage::{
    ArtifactId, ArtifactSummary, BincodePacker, CallRecord, SqliteSink, StoredArtifact,
};

use crate::error::ApiError;

/// Decodes posted records, runs them through the [`Recorder`] and persists
/// the results in a [`SqliteSink`].
pub struct RecordingService {
    recorder: Recorder,
    sink: SqliteSink,
}

impl RecordingService {
    /// Opens (or creates) the artifact database at `db_path`.
    pub fn new(db_path: &str, options: RecorderOptions) -> Result<Self, ApiError> {
        Ok(RecordingService {
            recorder: Recorder::new(options),
            sink: SqliteSink::new(db_path)?,
        })
    }

    /// A service backed by an in-memory database (for testing).
    pub fn in_memory(options: RecorderOptions) -> Result<Self, ApiError> {
        Ok(RecordingService {
            recorder: Recorder::new(options),
            sink: SqliteSink::in_memory()?,
        })
    }

    /// Decodes a packed call record.
    pub fn decode(bytes: &[u8]) -> Result<CallRecord, ApiError> {
        Ok(CallRecord::unpack(bytes, &BincodePacker)?)
    }

    /// Generates and persists the artifacts for `record`.
    ///
    /// With a `remote_prefix`, the record's return value is first scanned
    /// for remote references.
    pub fn record(
        &mut self,
        mut record: CallRecord,
        remote_prefix: Option<&str>,
    ) -> Result<GeneratedArtifacts, ApiError> {
        if let Some(prefix) = remote_prefix {
            annotate_remote_returns(&mut record, prefix)?;
        }
        Ok(self.recorder.record_call(&record, &mut self.sink)?)
    }

    pub fn list_artifacts(&self) -> Result<Vec<ArtifactSummary>, ApiError> {
        Ok(self.sink.list_artifacts()?)
    }

    pub fn get_artifact(&self, id: &ArtifactId) -> Result<StoredArtifact, ApiError> {
        Ok(self.sink.get_artifact(id)?)
    }
}
