//! Binary framing of a completed [`CallRecord`].
//!
//! # Wire layout
//!
//! ```text
//! [len:u16be]["CALL"]                     -- header tag
//! [len:u16be][method name: UTF-8]
//! [len:u32be][packed arguments]           -- opaque, see ArgumentPacker
//! [len:u16be]["RETURN"]                   -- separator tag
//! [discriminant:u8]                       -- 1 = thrown, 0 = returned
//! [len:u32be][outcome payload: bincode]
//! [len:u16be]["END"]                      -- trailer tag
//! ```
//!
//! Fail-closed: a tag that does not match at its position is a framing
//! error ([`StorageError::Format`]), as are truncated input and trailing
//! bytes. A well-framed block that fails to decode is a corruption error.
//! Target, index and parameter types are not part of the frame.

use rmirec_core::mangle;

use crate::error::StorageError;
use crate::packer::ArgumentPacker;
use crate::record::{CallRecord, Outcome, Payload};

pub const HEADER_TAG: &str = "CALL";
pub const SEPARATOR_TAG: &str = "RETURN";
pub const TRAILER_TAG: &str = "END";

impl CallRecord {
    /// Serializes this record. The record must be completed.
    pub fn pack(&self) -> Result<Vec<u8>, StorageError> {
        let outcome = self.outcome.as_ref().ok_or_else(|| {
            StorageError::State(format!(
                "cannot pack call to '{}' before it completes",
                self.method_name
            ))
        })?;
        let payload = bincode::serialize(outcome.payload())
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        let mut buf = Vec::with_capacity(
            self.packed_arguments.len() + payload.len() + self.method_name.len() + 32,
        );
        write_utf(&mut buf, HEADER_TAG)?;
        write_utf(&mut buf, &self.method_name)?;
        write_block(&mut buf, &self.packed_arguments)?;
        write_utf(&mut buf, SEPARATOR_TAG)?;
        buf.push(u8::from(outcome.is_failure()));
        write_block(&mut buf, &payload)?;
        write_utf(&mut buf, TRAILER_TAG)?;
        Ok(buf)
    }

    /// Parses a record produced by [`CallRecord::pack`], rehydrating its
    /// arguments with `packer`.
    ///
    /// The result has index 0, an empty target and no parameter types; use
    /// [`CallRecord::with_origin`] to restore the session context.
    pub fn unpack(data: &[u8], packer: &dyn ArgumentPacker) -> Result<CallRecord, StorageError> {
        let mut reader = Reader::new(data);

        reader.expect_tag(HEADER_TAG)?;
        let method_name = reader.read_utf("method name")?.to_string();
        let packed_arguments = reader.read_block("packed arguments")?.to_vec();
        reader.expect_tag(SEPARATOR_TAG)?;

        let is_failure = match reader.read_u8("outcome discriminant")? {
            0 => false,
            1 => true,
            other => {
                return Err(StorageError::Corrupt {
                    section: "outcome discriminant",
                    reason: format!("expected 0 or 1, found {other}"),
                })
            }
        };
        let payload_bytes = reader.read_block("outcome payload")?;
        let payload: Payload =
            bincode::deserialize(payload_bytes).map_err(|e| StorageError::Corrupt {
                section: "outcome payload",
                reason: e.to_string(),
            })?;
        payload
            .heap
            .validate([&payload.value])
            .map_err(|e| StorageError::Corrupt {
                section: "outcome payload",
                reason: e.to_string(),
            })?;

        reader.expect_tag(TRAILER_TAG)?;
        reader.finish()?;

        let arguments = packer.unpack(&packed_arguments)?;
        let outcome = if is_failure {
            Outcome::Thrown(payload)
        } else {
            Outcome::Returned(payload)
        };

        Ok(CallRecord {
            index: 0,
            target: String::new(),
            scope: String::new(),
            signature: mangle(&method_name, None),
            method_name,
            argument_types: None,
            packed_arguments,
            arguments: Some(arguments),
            outcome: Some(outcome),
            remote_returned: false,
            remote_paths_in_return: Default::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn write_utf(buf: &mut Vec<u8>, s: &str) -> Result<(), StorageError> {
    let len = u16::try_from(s.len())
        .map_err(|_| StorageError::Encode(format!("string of {} bytes exceeds u16", s.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_block(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), StorageError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| StorageError::Encode(format!("block of {} bytes exceeds u32", bytes.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Cursor over an input buffer. Every read is bounds-checked.
struct Reader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, cursor: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn take(&mut self, len: usize, section: &'static str) -> Result<&'a [u8], StorageError> {
        if len > self.remaining() {
            return Err(StorageError::Truncated {
                section,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    fn read_u8(&mut self, section: &'static str) -> Result<u8, StorageError> {
        Ok(self.take(1, section)?[0])
    }

    fn read_utf(&mut self, section: &'static str) -> Result<&'a str, StorageError> {
        let len_bytes = self.take(2, section)?;
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let bytes = self.take(len, section)?;
        std::str::from_utf8(bytes).map_err(|e| StorageError::Corrupt {
            section,
            reason: e.to_string(),
        })
    }

    fn read_block(&mut self, section: &'static str) -> Result<&'a [u8], StorageError> {
        let len_bytes = self.take(4, section)?;
        let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        self.take(len as usize, section)
    }

    /// Reads a length-prefixed tag and checks it against `expected`.
    fn expect_tag(&mut self, expected: &'static str) -> Result<(), StorageError> {
        let len_bytes = self.take(2, expected)?;
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let found = self.take(len, expected)?;
        if found != expected.as_bytes() {
            return Err(StorageError::Format {
                expected: expected.to_string(),
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), StorageError> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(StorageError::TrailingBytes { count }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{Arguments, BincodePacker};
    use rmirec_core::{Field, Heap, Object, ObjectId, PrimitiveKind, StructObject, TypeDesc, Value};

    fn completed_fetch() -> CallRecord {
        let mut r = CallRecord::new(
            4,
            "//host/files",
            "fetch",
            Some(vec![TypeDesc::string()]),
            Arguments::scalars(vec![Value::text("a.txt")]),
            &BincodePacker,
        )
        .unwrap();
        r.complete(Payload::inline(Value::Long(12))).unwrap();
        r
    }

    #[test]
    fn layout_starts_with_header_and_ends_with_trailer() {
        let bytes = completed_fetch().pack().unwrap();
        assert_eq!(&bytes[..6], &[0, 4, b'C', b'A', b'L', b'L']);
        assert_eq!(&bytes[bytes.len() - 5..], &[0, 3, b'E', b'N', b'D']);
        assert_eq!(&bytes[6..8], &[0, 5]);
        assert_eq!(&bytes[8..13], b"fetch");
    }

    #[test]
    fn roundtrip_restores_method_outcome_and_arguments() {
        let r = completed_fetch();
        let back = CallRecord::unpack(&r.pack().unwrap(), &BincodePacker).unwrap();
        assert_eq!(back.method_name(), "fetch");
        assert_eq!(back.outcome(), r.outcome());
        assert_eq!(back.arguments(), r.arguments());
        assert_eq!(back.packed_arguments(), r.packed_arguments());
        // Parameter types do not survive the round trip.
        assert!(back.argument_types().is_none());
        assert_eq!(back.mangled_signature(), "fetch:");
        assert_eq!(back.index(), 0);
        assert_eq!(back.target(), "");
    }

    #[test]
    fn roundtrip_thrown_structured_failure() {
        let mut heap = Heap::new();
        let err = heap.alloc_struct(
            StructObject::new("java.rmi.RemoteException")
                .with_field(Field::new("detail", TypeDesc::string(), Value::text("refused"))),
        );
        let mut r = completed_fetch();
        r.outcome = None;
        r.complete_with_failure(Payload::new(heap, Value::Ref(err)))
            .unwrap();

        let back = CallRecord::unpack(&r.pack().unwrap(), &BincodePacker).unwrap();
        assert!(back.is_failure());
        assert_eq!(back.thrown().unwrap(), r.thrown().unwrap());
    }

    #[test]
    fn pending_record_cannot_be_packed() {
        let r = CallRecord::new(
            0,
            "t",
            "ping",
            None,
            Arguments::default(),
            &BincodePacker,
        )
        .unwrap();
        assert!(matches!(r.pack(), Err(StorageError::State(_))));
    }

    #[test]
    fn wrong_header_tag_is_format_error() {
        let mut bytes = completed_fetch().pack().unwrap();
        bytes[2] = b'X';
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(
            matches!(&err, StorageError::Format { expected, found } if expected == "CALL" && found == "XALL")
        );
        assert!(err.is_framing());
    }

    #[test]
    fn wrong_separator_tag_is_format_error() {
        let r = completed_fetch();
        let mut bytes = r.pack().unwrap();
        // header(6) + method(2+5) + block(4+len)
        let sep_at = 6 + 7 + 4 + r.packed_arguments().len();
        assert_eq!(&bytes[sep_at + 2..sep_at + 8], b"RETURN");
        bytes[sep_at + 2] = b'r';
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(matches!(err, StorageError::Format { ref expected, .. } if expected == "RETURN"));
    }

    #[test]
    fn wrong_trailer_tag_is_format_error() {
        let mut bytes = completed_fetch().pack().unwrap();
        let last = bytes.len() - 1;
        bytes[last] = b'X';
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(matches!(err, StorageError::Format { ref expected, .. } if expected == "END"));
    }

    #[test]
    fn truncated_input_is_framing_error() {
        let bytes = completed_fetch().pack().unwrap();
        for cut in [0, 1, 5, 12, bytes.len() - 1] {
            let err = CallRecord::unpack(&bytes[..cut], &BincodePacker).unwrap_err();
            assert!(err.is_framing(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = completed_fetch().pack().unwrap();
        bytes.push(0);
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(matches!(err, StorageError::TrailingBytes { count: 1 }));
    }

    #[test]
    fn bad_discriminant_is_corruption() {
        let r = completed_fetch();
        let mut bytes = r.pack().unwrap();
        let disc_at = 6 + 7 + 4 + r.packed_arguments().len() + 8;
        bytes[disc_at] = 7;
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn corrupt_argument_block_is_not_a_framing_error() {
        let r = completed_fetch();
        let mut bytes = r.pack().unwrap();
        // First byte of the packed block is the encoding version.
        bytes[6 + 7 + 4] = 42;
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedPackVersion(42)));
        assert!(!err.is_framing());
    }

    fn completed_with(payload: Payload) -> CallRecord {
        let mut r = completed_fetch();
        r.outcome = None;
        r.complete(payload).unwrap();
        r
    }

    #[test]
    fn deeply_nested_array_type_is_corruption() {
        let int_array = TypeDesc::array_of(TypeDesc::Primitive(PrimitiveKind::Int));
        let mut bytes = completed_with(Payload::inline(Value::Class(int_array)))
            .pack()
            .unwrap();
        // The dimension count is the last field of the payload, just before
        // the trailer tag.
        let dims_at = bytes.len() - 5 - 4;
        assert_eq!(&bytes[dims_at..dims_at + 4], &1u32.to_le_bytes());
        bytes[dims_at..dims_at + 4].copy_from_slice(&400_000u32.to_le_bytes());

        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { section: "outcome payload", .. }));
        assert!(!err.is_framing());

        bytes[dims_at..dims_at + 4].copy_from_slice(&255u32.to_le_bytes());
        let back = CallRecord::unpack(&bytes, &BincodePacker).unwrap();
        let Some(Outcome::Returned(payload)) = back.outcome() else {
            panic!("expected a returned outcome");
        };
        assert!(matches!(&payload.value, Value::Class(ty) if ty.dimensions() == 255));
    }

    #[test]
    fn dangling_payload_reference_is_corruption() {
        let bytes = completed_with(Payload::new(Heap::new(), Value::Ref(ObjectId(3))))
            .pack()
            .unwrap();
        let err = CallRecord::unpack(&bytes, &BincodePacker).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("object not found"));
    }

    #[test]
    fn heap_backed_arguments_roundtrip() {
        let mut heap = Heap::new();
        let list = heap.alloc_ref(Object::Collection {
            class: "java.util.ArrayList".into(),
            elements: vec![Value::Int(1), Value::text("two")],
        });
        let mut r = CallRecord::new(
            1,
            "t",
            "store",
            Some(vec![TypeDesc::class("java.util.List")]),
            Arguments::new(heap, vec![list]),
            &BincodePacker,
        )
        .unwrap();
        r.complete(Payload::inline(Value::Bool(true))).unwrap();
        let back = CallRecord::unpack(&r.pack().unwrap(), &BincodePacker).unwrap();
        assert_eq!(back.arguments(), r.arguments());
    }
}
