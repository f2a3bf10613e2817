//! Artifact types produced by the recording pipeline.
//!
//! A recorded call becomes one primary [`SamplerArtifact`] (replays the call
//! with reconstructed arguments) and, when the call returned remote
//! references, one secondary [`PostProcessorArtifact`] that registers them
//! for later calls.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a generated artifact.
///
/// Derived from the call's identity (see [`crate::hash::artifact_id_for_call`]),
/// so re-delivering the same call yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The primary artifact: replays one remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerArtifact {
    pub id: ArtifactId,
    /// Display name, rendered from the recorder's name format.
    pub name: String,
    /// Identity of the remote object the call targets.
    pub target: String,
    pub method_name: String,
    /// Script returning the reconstructed argument array.
    pub arguments_script: String,
}

/// The secondary artifact: runs after its sampler to register remote
/// references found in the sampler's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessorArtifact {
    pub id: ArtifactId,
    pub name: String,
    pub script: String,
    /// Reset embedded interpreter state before running.
    pub reset_interpreter: bool,
    /// The sampler this post-processor is attached to.
    pub runs_after: ArtifactId,
}

/// A persisted sampler with its optional post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub call_index: u32,
    pub mangled_signature: String,
    pub sampler: SamplerArtifact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_processor: Option<PostProcessorArtifact>,
}

/// Summary of a stored artifact (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub id: ArtifactId,
    pub name: String,
    pub call_index: u32,
    pub target: String,
    pub method_name: String,
    pub has_post_processor: bool,
}
