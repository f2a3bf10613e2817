//! Core error types for rmirec-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of the value model.

use crate::id::ObjectId;
use thiserror::Error;

/// Core errors produced by the rmirec-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An object id was not found in the heap.
    #[error("object not found: ObjectId({id})", id = id.0)]
    ObjectNotFound { id: ObjectId },

    /// An object was found but has a different shape than the caller required.
    #[error("object {id} is not a {expected}", id = id.0)]
    UnexpectedShape { id: ObjectId, expected: &'static str },

    /// A struct has no field with the given name.
    #[error("no field '{name}' on {class}")]
    FieldNotFound { class: String, name: String },

    /// An array type nests deeper than the supported maximum.
    #[error("array type has {dimensions} dimensions, at most {max} are supported")]
    TooManyDimensions { dimensions: u32, max: u32 },

    /// A character value does not fit in one UTF-16 code unit.
    #[error("character {0:?} does not fit in a single UTF-16 unit")]
    CharOutsideBmp(char),
}
