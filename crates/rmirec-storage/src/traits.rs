//! The [`ArtifactSink`] trait: where generated artifacts are delivered.
//!
//! The recording pipeline hands every artifact produced for one call to the
//! sink in a single `deliver` call. The sink owns persistence and ordering;
//! the pipeline makes no assumption about its internal representation.

use crate::error::StorageError;
use crate::record::CallRecord;
use crate::types::{PostProcessorArtifact, SamplerArtifact};

/// Receives the artifacts generated for one recorded call.
pub trait ArtifactSink {
    /// Delivers a primary artifact, its optional post-processor, and the
    /// call record both were generated from.
    fn deliver(
        &mut self,
        primary: &SamplerArtifact,
        secondary: Option<&PostProcessorArtifact>,
        record: &CallRecord,
    ) -> Result<(), StorageError>;
}
