//! Call-record codec and artifact persistence for rmirec.
//!
//! Provides the binary framing of a recorded call ([`CallRecord::pack`] /
//! [`CallRecord::unpack`]), the [`ArgumentPacker`] contract that encodes the
//! argument list embedded in that frame, and the [`ArtifactSink`] trait that
//! receives generated test artifacts, with [`InMemorySink`] and
//! [`SqliteSink`] as first-class backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`packer`]: Argument list encoding and the default bincode packer
//! - [`record`]: CallRecord, its outcome and lifecycle
//! - [`codec`]: Binary record framing (pack/unpack)
//! - [`types`]: Artifact identifiers and artifact types
//! - [`hash`]: Collision-resistant artifact identifiers via blake3
//! - [`traits`]: ArtifactSink trait definition
//! - [`memory`]: InMemorySink implementation
//! - [`schema`]: SQL schema and migration setup
//! - [`sqlite`]: SqliteSink implementation

pub mod codec;
pub mod error;
pub mod hash;
pub mod memory;
pub mod packer;
pub mod record;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::{Delivery, InMemorySink};
pub use packer::{ArgumentPacker, Arguments, BincodePacker, PACK_VERSION};
pub use record::{CallRecord, Outcome, Payload};
pub use sqlite::SqliteSink;
pub use traits::ArtifactSink;
pub use types::{ArtifactId, ArtifactSummary, PostProcessorArtifact, SamplerArtifact, StoredArtifact};
