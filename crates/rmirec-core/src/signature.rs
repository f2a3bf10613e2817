//! Canonical method signature keys.
//!
//! [`mangle`] derives a stable string key from a method name and its
//! parameter types. The full key (`name:type1,type2`) identifies a call for
//! storage and lookup; the argument suffix (`type1,type2`) is embedded in
//! generated code as a traceability tag.
//!
//! Two distinct signatures collide only if their canonical type names
//! coincide; no attempt is made to disambiguate further.

use serde::{Deserialize, Serialize};

use crate::types::TypeDesc;

/// The mangled key pair for a method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MangledSignature {
    /// `name:` followed by the argument suffix.
    pub full: String,
    /// Comma-joined canonical parameter type names; empty for no parameters.
    pub args: String,
}

/// Mangles `method_name` and its parameter types into a [`MangledSignature`].
///
/// `None` and an empty slice are equivalent: both yield `name:` with an
/// empty argument suffix.
pub fn mangle(method_name: &str, argument_types: Option<&[TypeDesc]>) -> MangledSignature {
    let types = match argument_types {
        Some(types) if !types.is_empty() => types,
        _ => {
            return MangledSignature {
                full: format!("{method_name}:"),
                args: String::new(),
            }
        }
    };

    let args = types
        .iter()
        .map(TypeDesc::canonical_name)
        .collect::<Vec<_>>()
        .join(",");

    MangledSignature {
        full: format!("{method_name}:{args}"),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;
    use proptest::prelude::*;

    #[test]
    fn single_primitive_parameter() {
        let sig = mangle("setCount", Some(&[TypeDesc::Primitive(PrimitiveKind::Int)]));
        assert_eq!(sig.full, "setCount:int");
        assert_eq!(sig.args, "int");
    }

    #[test]
    fn no_parameters() {
        let sig = mangle("noop", Some(&[]));
        assert_eq!(sig.full, "noop:");
        assert_eq!(sig.args, "");
        assert_eq!(mangle("noop", None), sig);
    }

    #[test]
    fn multiple_parameters_in_declared_order() {
        let sig = mangle(
            "getResource",
            Some(&[
                TypeDesc::string(),
                TypeDesc::array_of(TypeDesc::Primitive(PrimitiveKind::Byte)),
                TypeDesc::class("java.util.Map"),
            ]),
        );
        assert_eq!(sig.full, "getResource:java.lang.String,byte[],java.util.Map");
        assert_eq!(sig.args, "java.lang.String,byte[],java.util.Map");
    }

    #[test]
    fn overloads_get_distinct_keys() {
        let a = mangle("put", Some(&[TypeDesc::Primitive(PrimitiveKind::Int)]));
        let b = mangle("put", Some(&[TypeDesc::Primitive(PrimitiveKind::Long)]));
        assert_ne!(a.full, b.full);
    }

    fn arb_type() -> impl Strategy<Value = TypeDesc> {
        let leaf = prop_oneof![
            proptest::sample::select(PrimitiveKind::ALL.to_vec()).prop_map(TypeDesc::Primitive),
            "[a-z]{1,6}(\\.[A-Z][a-z]{0,6}){1,3}".prop_map(TypeDesc::Class),
        ];
        leaf.prop_recursive(2, 4, 1, |inner| inner.prop_map(TypeDesc::array_of))
    }

    proptest! {
        #[test]
        fn mangle_is_pure(name in "[a-z][a-zA-Z0-9]{0,12}", types in proptest::collection::vec(arb_type(), 0..5)) {
            let first = mangle(&name, Some(&types));
            let second = mangle(&name, Some(&types));
            prop_assert_eq!(&first, &second);
            let prefix = format!("{}:", name);
            prop_assert!(first.full.starts_with(&prefix));
            prop_assert_eq!(first.full, format!("{}:{}", name, first.args));
            prop_assert!(!second.args.ends_with(','));
        }
    }
}
