//! Argument list encoding.
//!
//! The [`ArgumentPacker`] trait is the contract between the call record and
//! whatever encodes its argument list. The record frame only knows the byte
//! count of the packed block, so the argument encoding can evolve without
//! touching record framing.
//!
//! [`BincodePacker`] is the default implementation: a one-byte encoding
//! version followed by the bincode form of [`Arguments`].

use serde::{Deserialize, Serialize};

use rmirec_core::{Heap, Value};

use crate::error::StorageError;

/// Encoding version written by [`BincodePacker`].
pub const PACK_VERSION: u8 = 1;

/// An ordered argument list together with the heap its references point into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    pub heap: Heap,
    pub values: Vec<Value>,
}

impl Arguments {
    pub fn new(heap: Heap, values: Vec<Value>) -> Self {
        Arguments { heap, values }
    }

    /// Arguments with no heap objects.
    pub fn scalars(values: Vec<Value>) -> Self {
        Arguments {
            heap: Heap::new(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encodes an argument list to bytes and back.
///
/// Implementations must round-trip: `unpack(pack(a))` equals `a` for every
/// argument list the interception layer produces.
pub trait ArgumentPacker: Send + Sync {
    fn pack(&self, arguments: &Arguments) -> Result<Vec<u8>, StorageError>;

    fn unpack(&self, bytes: &[u8]) -> Result<Arguments, StorageError>;
}

/// Versioned bincode encoding of [`Arguments`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodePacker;

impl ArgumentPacker for BincodePacker {
    fn pack(&self, arguments: &Arguments) -> Result<Vec<u8>, StorageError> {
        let body =
            bincode::serialize(arguments).map_err(|e| StorageError::Encode(e.to_string()))?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(PACK_VERSION);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn unpack(&self, bytes: &[u8]) -> Result<Arguments, StorageError> {
        let (version, body) = bytes.split_first().ok_or(StorageError::Corrupt {
            section: "arguments",
            reason: "empty argument block".to_string(),
        })?;
        if *version != PACK_VERSION {
            return Err(StorageError::UnsupportedPackVersion(*version));
        }
        let arguments: Arguments =
            bincode::deserialize(body).map_err(|e| StorageError::Corrupt {
                section: "arguments",
                reason: e.to_string(),
            })?;
        arguments
            .heap
            .validate(&arguments.values)
            .map_err(|e| StorageError::Corrupt {
                section: "arguments",
                reason: e.to_string(),
            })?;
        Ok(arguments)
    }
}
