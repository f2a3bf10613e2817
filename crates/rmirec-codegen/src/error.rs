//! Codegen error types covering scriptlet generation and recording failures.

use rmirec_core::CoreError;
use rmirec_storage::StorageError;

/// Errors that can occur while compiling values or recording a call.
///
/// Shape problems inside a value graph (unreadable fields, missing
/// constructors, unrecognized shapes) are not errors: they degrade to
/// placeholder code. A broken heap, a graph nested past the configured
/// limit or a failing collaborator is.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The value graph refers to an object its heap does not contain, or
    /// holds a value the replay language cannot express.
    #[error("invalid value graph: {0}")]
    Graph(#[from] CoreError),

    /// Objects are nested deeper than the generator will follow.
    #[error("value graph nests objects deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    /// Rehydrating arguments or delivering artifacts failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
