//! Identity newtype for heap-allocated values.
//!
//! An [`ObjectId`] is the reference identity of an object in a [`Heap`].
//! Two values referring to the same `ObjectId` are the same object (aliases),
//! regardless of whether some other object happens to be structurally equal.
//!
//! [`Heap`]: crate::value::Heap

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable object identifier: an index into the owning heap's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ObjectId {
    fn from(idx: usize) -> Self {
        ObjectId(idx as u32)
    }
}

impl From<ObjectId> for usize {
    fn from(id: ObjectId) -> Self {
        id.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_to_index_roundtrip() {
        let id = ObjectId::from(42usize);
        assert_eq!(id.0, 42);

        let back: usize = id.into();
        assert_eq!(back, 42);
    }

    #[test]
    fn object_id_display() {
        assert_eq!(format!("{}", ObjectId(7)), "7");
    }

    #[test]
    fn serde_roundtrip() {
        let id = ObjectId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
