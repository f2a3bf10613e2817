//! Collision-resistant artifact identifiers using blake3.
//!
//! Identifiers are derived state: the same call identity (recording scope,
//! target, signature and index) always produces the same id, and ids are
//! never stored independently of the data they were derived from.

use crate::record::CallRecord;
use crate::types::ArtifactId;

/// Number of hex characters kept from the digest.
const ID_HEX_LEN: usize = 16;

/// Derives the artifact id for a call from its recording scope, target,
/// mangled signature and index.
///
/// Each component is length-prefixed before hashing so that shifting bytes
/// between adjacent components cannot produce the same digest.
pub fn artifact_id_for_call(
    scope: &str,
    target: &str,
    mangled_signature: &str,
    index: u32,
) -> ArtifactId {
    let mut hasher = blake3::Hasher::new();
    for part in [scope, target, mangled_signature] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.update(&index.to_le_bytes());
    truncate(hasher.finalize())
}

/// Id of the primary artifact for `record`.
pub fn artifact_id_for_record(record: &CallRecord) -> ArtifactId {
    artifact_id_for_call(
        record.scope(),
        record.target(),
        record.mangled_signature(),
        record.index(),
    )
}

/// Id of an artifact attached to `parent`, distinguished by `role`.
pub fn derived_artifact_id(parent: &ArtifactId, role: &str) -> ArtifactId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(parent.0.as_bytes());
    hasher.update(b"/");
    hasher.update(role.as_bytes());
    truncate(hasher.finalize())
}

fn truncate(hash: blake3::Hash) -> ArtifactId {
    let hex = hash.to_hex();
    ArtifactId(hex.as_str()[..ID_HEX_LEN].to_string())
}
