//! Remote-reference path scanner.
//!
//! Walks a call's return value looking for objects marked as remote
//! references and records, for each one, a handle name and the accessor
//! path that reaches it from the return value. The result script uses the
//! paths to register those references for later calls.
//!
//! Path segments: `.field` for struct fields, `[i]` for array elements,
//! `.toArray()[i]` for collection elements, `.get("key")` for text-keyed
//! map entries and `.values().toArray()[i]` for other map entries. A remote
//! object is registered as a whole; its own fields are not searched.

use std::collections::HashSet;

use indexmap::IndexMap;
use rmirec_core::{FieldSlot, Heap, Object, ObjectId, Value};
use rmirec_storage::{CallRecord, Outcome, Payload};

use crate::error::CodegenError;
use crate::literal::string_literal;

/// Deepest chain of objects the scanner follows from the return value.
pub const MAX_PATH_DEPTH: usize = 1024;

/// Finds every remote reference reachable from `payload`.
///
/// Returns handle name to accessor path, in discovery order. Handles are
/// `handle_prefix` followed by a counter starting at 0. Each object is
/// visited once, so a remote reachable along several paths is registered
/// under the first one found.
pub fn find_remote_paths(
    payload: &Payload,
    handle_prefix: &str,
) -> Result<IndexMap<String, String>, CodegenError> {
    let mut scanner = Scanner {
        heap: &payload.heap,
        handle_prefix,
        visited: HashSet::new(),
        paths: IndexMap::new(),
    };
    scanner.scan(&payload.value)?;
    Ok(scanner.paths)
}

/// Scans a completed record's return value and annotates the record with
/// the remote references found.
///
/// The record is only marked as having returned remotes if at least one
/// path is found. Thrown outcomes and pending records are left untouched.
/// Returns the number of remote references found.
pub fn annotate_remote_returns(
    record: &mut CallRecord,
    handle_prefix: &str,
) -> Result<usize, CodegenError> {
    let paths = match record.outcome() {
        Some(Outcome::Returned(payload)) => find_remote_paths(payload, handle_prefix)?,
        _ => return Ok(0),
    };
    let found = paths.len();
    if found > 0 {
        tracing::debug!(
            method = record.method_name(),
            remotes = found,
            "return value carries remote references"
        );
        record.set_remote_returned(true);
        record.set_remote_paths_in_return(paths);
    }
    Ok(found)
}

struct Scanner<'a> {
    heap: &'a Heap,
    handle_prefix: &'a str,
    visited: HashSet<ObjectId>,
    paths: IndexMap<String, String>,
}

/// A value waiting to be visited, with its path and the number of objects
/// above it.
struct Pending<'a> {
    value: &'a Value,
    path: String,
    depth: usize,
}

impl<'a> Scanner<'a> {
    /// Depth-first walk with an explicit stack. Children are pushed in
    /// reverse so they are visited in declaration order.
    fn scan(&mut self, root: &'a Value) -> Result<(), CodegenError> {
        let heap = self.heap;
        let mut stack = vec![Pending {
            value: root,
            path: String::new(),
            depth: 0,
        }];
        let mut children = Vec::new();

        while let Some(Pending { value, path, depth }) = stack.pop() {
            let Value::Ref(id) = value else {
                continue;
            };
            if !self.visited.insert(*id) {
                continue;
            }
            if depth >= MAX_PATH_DEPTH {
                return Err(CodegenError::NestingTooDeep {
                    limit: MAX_PATH_DEPTH,
                });
            }

            let object = heap.get(*id)?;
            if let Object::Struct(stub) = object {
                if stub.remote {
                    let handle = format!("{}{}", self.handle_prefix, self.paths.len());
                    self.paths.insert(handle, path);
                    continue;
                }
            }

            let child = |value: &'a Value, segment: String| Pending {
                value,
                path: format!("{path}{segment}"),
                depth: depth + 1,
            };
            match object {
                Object::Struct(object) => {
                    for field in &object.fields {
                        if let FieldSlot::Value(value) = &field.slot {
                            children.push(child(value, format!(".{}", field.name)));
                        }
                    }
                }
                Object::Array { elements, .. } => {
                    for (i, element) in elements.iter().enumerate() {
                        children.push(child(element, format!("[{i}]")));
                    }
                }
                Object::Collection { elements, .. } => {
                    for (i, element) in elements.iter().enumerate() {
                        children.push(child(element, format!(".toArray()[{i}]")));
                    }
                }
                Object::Map { entries, .. } => {
                    for (i, (key, value)) in entries.iter().enumerate() {
                        let segment = match key {
                            Value::Text(key) => format!(".get({})", string_literal(key)),
                            _ => format!(".values().toArray()[{i}]"),
                        };
                        children.push(child(value, segment));
                    }
                }
                Object::Properties(_) => {}
            }
            stack.extend(children.drain(..).rev());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmirec_core::{Field, StructObject, TypeDesc};
    use rmirec_storage::{Arguments, BincodePacker};

    fn remote(heap: &mut Heap, class: &str) -> Value {
        Value::Ref(heap.alloc_struct(StructObject::new(class).as_remote()))
    }

    fn record_returning(payload: Payload) -> CallRecord {
        let mut record = CallRecord::new(
            0,
            "Broker",
            "lookup",
            Some(vec![]),
            Arguments::scalars(vec![]),
            &BincodePacker,
        )
        .unwrap();
        record.complete(payload).unwrap();
        record
    }

    #[test]
    fn remote_root_has_empty_path() {
        let mut heap = Heap::new();
        let value = remote(&mut heap, "com.acme.AccountStub");
        let paths = find_remote_paths(&Payload::new(heap, value), "remote").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths["remote0"], "");
    }

    #[test]
    fn paths_through_fields_arrays_and_collections() {
        let mut heap = Heap::new();
        let a = remote(&mut heap, "com.acme.AStub");
        let b = remote(&mut heap, "com.acme.BStub");
        let array = heap.alloc_ref(Object::Array {
            component: TypeDesc::object(),
            elements: vec![Value::Null, a],
        });
        let list = heap.alloc_ref(Object::Collection {
            class: "java.util.ArrayList".to_string(),
            elements: vec![b],
        });
        let root = heap.alloc_struct(
            StructObject::new("com.acme.Reply")
                .with_field(Field::new("items", TypeDesc::array_of(TypeDesc::object()), array))
                .with_field(Field::new("more", TypeDesc::class("java.util.List"), list)),
        );

        let paths = find_remote_paths(&Payload::new(heap, Value::Ref(root)), "h").unwrap();
        let collected: Vec<(&str, &str)> =
            paths.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            collected,
            vec![("h0", ".items[1]"), ("h1", ".more.toArray()[0]")]
        );
    }

    #[test]
    fn map_paths_use_text_keys() {
        let mut heap = Heap::new();
        let a = remote(&mut heap, "com.acme.AStub");
        let b = remote(&mut heap, "com.acme.BStub");
        let map = heap.alloc_ref(Object::Map {
            class: "java.util.HashMap".to_string(),
            entries: vec![(Value::text("main"), a), (Value::Int(2), b)],
        });
        let paths = find_remote_paths(&Payload::new(heap, map), "r").unwrap();
        assert_eq!(paths["r0"], ".get(\"main\")");
        assert_eq!(paths["r1"], ".values().toArray()[1]");
    }

    #[test]
    fn shared_remote_is_registered_once() {
        let mut heap = Heap::new();
        let a = remote(&mut heap, "com.acme.AStub");
        let list = heap.alloc_ref(Object::Collection {
            class: "java.util.ArrayList".to_string(),
            elements: vec![a.clone(), a],
        });
        let paths = find_remote_paths(&Payload::new(heap, list), "r").unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn cycles_terminate() {
        let mut heap = Heap::new();
        let node = heap.alloc_struct(StructObject::new("com.acme.Node").with_field(Field::new(
            "next",
            TypeDesc::class("com.acme.Node"),
            Value::Null,
        )));
        heap.set_field(node, "next", Value::Ref(node)).unwrap();
        let paths = find_remote_paths(&Payload::new(heap, Value::Ref(node)), "r").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn siblings_are_scanned_in_declaration_order() {
        let mut heap = Heap::new();
        let a = remote(&mut heap, "com.acme.AStub");
        let b = remote(&mut heap, "com.acme.BStub");
        let inner = heap.alloc_struct(
            StructObject::new("com.acme.Inner")
                .with_field(Field::new("b", TypeDesc::class("com.acme.B"), b.clone())),
        );
        let root = heap.alloc_struct(
            StructObject::new("com.acme.Reply")
                .with_field(Field::new("inner", TypeDesc::class("com.acme.Inner"), Value::Ref(inner)))
                .with_field(Field::new("a", TypeDesc::class("com.acme.A"), a))
                .with_field(Field::new("again", TypeDesc::class("com.acme.B"), b)),
        );
        let paths = find_remote_paths(&Payload::new(heap, Value::Ref(root)), "h").unwrap();
        let collected: Vec<(&str, &str)> =
            paths.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(collected, vec![("h0", ".inner.b"), ("h1", ".a")]);
    }

    #[test]
    fn very_long_chains_are_rejected_without_exhausting_the_stack() {
        let mut heap = Heap::new();
        let mut next = remote(&mut heap, "com.acme.TailStub");
        for _ in 0..50_000 {
            let id = heap.alloc_struct(StructObject::new("com.acme.Node").with_field(Field::new(
                "next",
                TypeDesc::class("com.acme.Node"),
                next,
            )));
            next = Value::Ref(id);
        }
        let err = find_remote_paths(&Payload::new(heap, next), "r").unwrap_err();
        assert!(matches!(err, CodegenError::NestingTooDeep { limit: MAX_PATH_DEPTH }));
    }

    #[test]
    fn annotate_marks_record_only_when_found() {
        let mut heap = Heap::new();
        let value = remote(&mut heap, "com.acme.AccountStub");
        let mut with_remote = record_returning(Payload::new(heap, value));
        assert_eq!(annotate_remote_returns(&mut with_remote, "acct").unwrap(), 1);
        assert!(with_remote.is_remote_returned());
        assert_eq!(with_remote.remote_paths_in_return()["acct0"], "");

        let mut plain = record_returning(Payload::inline(Value::Int(4)));
        assert_eq!(annotate_remote_returns(&mut plain, "acct").unwrap(), 0);
        assert!(!plain.is_remote_returned());
        assert!(plain.remote_paths_in_return().is_empty());
    }

    #[test]
    fn thrown_and_pending_records_are_not_annotated() {
        let mut heap = Heap::new();
        let value = remote(&mut heap, "com.acme.AccountStub");
        let mut thrown = CallRecord::new(
            1,
            "Broker",
            "lookup",
            None,
            Arguments::scalars(vec![]),
            &BincodePacker,
        )
        .unwrap();
        let mut pending = thrown.clone();
        thrown.complete_with_failure(Payload::new(heap, value)).unwrap();

        assert_eq!(annotate_remote_returns(&mut thrown, "r").unwrap(), 0);
        assert!(!thrown.is_remote_returned());
        assert_eq!(annotate_remote_returns(&mut pending, "r").unwrap(), 0);
    }
}
