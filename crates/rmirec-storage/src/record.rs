//! The recorded unit of one intercepted remote call.
//!
//! A [`CallRecord`] is created by the interceptor with its index, target,
//! method, parameter types and arguments fixed. The argument list is packed
//! immediately; the packed bytes are the persisted form and the in-memory
//! [`Arguments`] are only ever rehydrated from them, never the reverse.
//!
//! The record is completed exactly once, with either a returned value or a
//! thrown failure. After completion only the two remote-reference
//! annotations may change; they are set by whoever inspects the outcome.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rmirec_core::{mangle, Heap, MangledSignature, TypeDesc, Value};

use crate::error::StorageError;
use crate::packer::{ArgumentPacker, Arguments};

/// A self-contained value graph: one root value and the heap it points into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub heap: Heap,
    pub value: Value,
}

impl Payload {
    pub fn new(heap: Heap, value: Value) -> Self {
        Payload { heap, value }
    }

    /// A payload holding an inline value with no heap objects.
    pub fn inline(value: Value) -> Self {
        Payload {
            heap: Heap::new(),
            value,
        }
    }
}

/// How a recorded call finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Returned(Payload),
    Thrown(Payload),
}

impl Outcome {
    /// The discriminant written to the wire: true for a thrown failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Thrown(_))
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Outcome::Returned(p) | Outcome::Thrown(p) => p,
        }
    }
}

/// One intercepted method invocation, its arguments and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub(crate) index: u32,
    pub(crate) target: String,
    /// Recording run the call belongs to; empty outside a session.
    pub(crate) scope: String,
    pub(crate) method_name: String,
    /// Not persisted; absent after [`CallRecord::unpack`].
    pub(crate) argument_types: Option<Vec<TypeDesc>>,
    pub(crate) signature: MangledSignature,
    pub(crate) packed_arguments: Vec<u8>,
    pub(crate) arguments: Option<Arguments>,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) remote_returned: bool,
    pub(crate) remote_paths_in_return: IndexMap<String, String>,
}

impl CallRecord {
    /// Records a call at interception time, packing `arguments` with `packer`.
    pub fn new(
        index: u32,
        target: impl Into<String>,
        method_name: impl Into<String>,
        argument_types: Option<Vec<TypeDesc>>,
        arguments: Arguments,
        packer: &dyn ArgumentPacker,
    ) -> Result<Self, StorageError> {
        let method_name = method_name.into();
        let signature = mangle(&method_name, argument_types.as_deref());
        let packed_arguments = packer.pack(&arguments)?;
        Ok(CallRecord {
            index,
            target: target.into(),
            scope: String::new(),
            method_name,
            argument_types,
            signature,
            packed_arguments,
            arguments: Some(arguments),
            outcome: None,
            remote_returned: false,
            remote_paths_in_return: IndexMap::new(),
        })
    }

    /// Restores the session context that the binary format does not carry.
    pub fn with_origin(mut self, index: u32, target: impl Into<String>) -> Self {
        self.index = index;
        self.target = target.into();
        self
    }

    /// Tags the record with the recording run it belongs to, so equal
    /// calls recorded in different runs get distinct artifact ids.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Declared parameter types, if still known.
    pub fn argument_types(&self) -> Option<&[TypeDesc]> {
        self.argument_types.as_deref()
    }

    pub fn signature(&self) -> &MangledSignature {
        &self.signature
    }

    /// Full mangled key, `name:type1,type2`.
    pub fn mangled_signature(&self) -> &str {
        &self.signature.full
    }

    /// Comma-joined parameter type names.
    pub fn mangled_args(&self) -> &str {
        &self.signature.args
    }

    pub fn packed_arguments(&self) -> &[u8] {
        &self.packed_arguments
    }

    /// The rehydrated argument list, if it has been materialized.
    pub fn arguments(&self) -> Option<&Arguments> {
        self.arguments.as_ref()
    }

    /// Rehydrates the arguments from the packed bytes, replacing any
    /// in-memory copy. Idempotent.
    pub fn recreate_arguments(
        &mut self,
        packer: &dyn ArgumentPacker,
    ) -> Result<&Arguments, StorageError> {
        let arguments = packer.unpack(&self.packed_arguments)?;
        Ok(self.arguments.insert(arguments))
    }

    /// Completes the call with a returned value.
    pub fn complete(&mut self, value: Payload) -> Result<(), StorageError> {
        self.set_outcome(Outcome::Returned(value))
    }

    /// Completes the call with a thrown failure.
    pub fn complete_with_failure(&mut self, error: Payload) -> Result<(), StorageError> {
        self.set_outcome(Outcome::Thrown(error))
    }

    fn set_outcome(&mut self, outcome: Outcome) -> Result<(), StorageError> {
        if self.outcome.is_some() {
            return Err(StorageError::AlreadyCompleted {
                method: self.method_name.clone(),
            });
        }
        self.outcome = Some(outcome);
        Ok(())
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.as_ref().is_some_and(Outcome::is_failure)
    }

    /// The outcome payload, whichever way the call finished.
    pub fn payload(&self) -> Result<&Payload, StorageError> {
        self.outcome.as_ref().map(Outcome::payload).ok_or_else(|| {
            StorageError::State(format!("call to '{}' has not completed", self.method_name))
        })
    }

    /// The thrown failure. Asking a normally returned (or pending) record
    /// for its failure is a caller error.
    pub fn thrown(&self) -> Result<&Payload, StorageError> {
        match &self.outcome {
            Some(Outcome::Thrown(p)) => Ok(p),
            Some(Outcome::Returned(_)) => Err(StorageError::State(format!(
                "call to '{}' returned normally; it has no failure",
                self.method_name
            ))),
            None => Err(StorageError::State(format!(
                "call to '{}' has not completed",
                self.method_name
            ))),
        }
    }

    pub fn set_remote_returned(&mut self, remote_returned: bool) {
        self.remote_returned = remote_returned;
    }

    pub fn is_remote_returned(&self) -> bool {
        self.remote_returned
    }

    /// Sets the handle name to access path mapping for remote references
    /// inside the return value.
    pub fn set_remote_paths_in_return(&mut self, paths: IndexMap<String, String>) {
        self.remote_paths_in_return = paths;
    }

    pub fn remote_paths_in_return(&self) -> &IndexMap<String, String> {
        &self.remote_paths_in_return
    }
}
