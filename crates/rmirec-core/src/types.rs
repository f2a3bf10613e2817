//! Type descriptors for recorded parameters, array components and classes.
//!
//! A [`TypeDesc`] names a type the way the generated scriptlets spell it:
//! primitive keywords (`int`, `long`, ...), canonical class names
//! (`java.util.ArrayList`) and array types (`int[]`, `java.lang.String[][]`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canonical name of the text type.
pub const STRING_CLASS: &str = "java.lang.String";

/// Canonical name of the root object type.
pub const OBJECT_CLASS: &str = "java.lang.Object";

/// Most array dimensions a type may have, as on the JVM.
pub const MAX_ARRAY_DIMENSIONS: u32 = 255;

/// Primitive (unboxed) scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds in declaration order.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// The source keyword for this primitive (`int`, `double`, ...).
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Canonical name of the boxed wrapper class.
    pub fn wrapper_class(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    /// Looks up a primitive by its keyword.
    pub fn from_keyword(keyword: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }
}

/// A type as seen by the recorder: primitive, named class, or array.
///
/// Serialized flat, as an element type plus a dimension count, so decoding
/// never recurses and rejects more than [`MAX_ARRAY_DIMENSIONS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EncodedTypeDesc", into = "EncodedTypeDesc")]
pub enum TypeDesc {
    /// Unboxed scalar.
    Primitive(PrimitiveKind),
    /// Any named class, by canonical name.
    Class(String),
    /// Array of the boxed component type.
    Array(Box<TypeDesc>),
}

impl TypeDesc {
    /// Shorthand for a named class.
    pub fn class(name: impl Into<String>) -> Self {
        TypeDesc::Class(name.into())
    }

    /// The text type.
    pub fn string() -> Self {
        TypeDesc::Class(STRING_CLASS.to_string())
    }

    /// The root object type.
    pub fn object() -> Self {
        TypeDesc::Class(OBJECT_CLASS.to_string())
    }

    /// An array whose elements have type `component`.
    pub fn array_of(component: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(component))
    }

    /// Canonical, fully qualified name: `int`, `java.lang.String`, `int[]`.
    pub fn canonical_name(&self) -> String {
        match self {
            TypeDesc::Primitive(kind) => kind.keyword().to_string(),
            TypeDesc::Class(name) => name.clone(),
            TypeDesc::Array(component) => format!("{}[]", component.canonical_name()),
        }
    }

    /// Unqualified name: `int`, `String`, `Entry` (for `a.b.Outer.Entry`), `int[]`.
    pub fn simple_name(&self) -> String {
        match self {
            TypeDesc::Primitive(kind) => kind.keyword().to_string(),
            TypeDesc::Class(name) => simple_class_name(name).to_string(),
            TypeDesc::Array(component) => format!("{}[]", component.simple_name()),
        }
    }

    /// Component type for arrays, `None` otherwise.
    pub fn component(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Number of array dimensions, 0 for non-arrays.
    pub fn dimensions(&self) -> u32 {
        let mut dims = 0;
        let mut ty = self;
        while let TypeDesc::Array(component) = ty {
            dims += 1;
            ty = component;
        }
        dims
    }

    /// The innermost non-array type.
    pub fn element(&self) -> &TypeDesc {
        let mut ty = self;
        while let TypeDesc::Array(component) = ty {
            ty = component;
        }
        ty
    }

    /// Returns true for unboxed primitives.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Primitive(_))
    }

    /// Returns true for boolean/character/numeric types (boxed or not) and text.
    ///
    /// Arrays with a scalar component are emitted as a single inline literal.
    pub fn is_scalar(&self) -> bool {
        match self {
            TypeDesc::Primitive(_) => true,
            TypeDesc::Class(name) => {
                name == STRING_CLASS
                    || PrimitiveKind::ALL
                        .iter()
                        .any(|kind| kind.wrapper_class() == name)
            }
            TypeDesc::Array(_) => false,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

/// Wire form of [`TypeDesc`].
#[derive(Serialize, Deserialize)]
struct EncodedTypeDesc {
    element: EncodedElement,
    dimensions: u32,
}

#[derive(Serialize, Deserialize)]
enum EncodedElement {
    Primitive(PrimitiveKind),
    Class(String),
}

impl From<TypeDesc> for EncodedTypeDesc {
    fn from(mut ty: TypeDesc) -> Self {
        let mut dimensions = 0;
        let element = loop {
            match ty {
                TypeDesc::Primitive(kind) => break EncodedElement::Primitive(kind),
                TypeDesc::Class(name) => break EncodedElement::Class(name),
                TypeDesc::Array(component) => {
                    dimensions += 1;
                    ty = *component;
                }
            }
        };
        EncodedTypeDesc {
            element,
            dimensions,
        }
    }
}

impl TryFrom<EncodedTypeDesc> for TypeDesc {
    type Error = CoreError;

    fn try_from(encoded: EncodedTypeDesc) -> Result<Self, Self::Error> {
        if encoded.dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(CoreError::TooManyDimensions {
                dimensions: encoded.dimensions,
                max: MAX_ARRAY_DIMENSIONS,
            });
        }
        let mut ty = match encoded.element {
            EncodedElement::Primitive(kind) => TypeDesc::Primitive(kind),
            EncodedElement::Class(name) => TypeDesc::Class(name),
        };
        for _ in 0..encoded.dimensions {
            ty = TypeDesc::array_of(ty);
        }
        Ok(ty)
    }
}

/// Strips the package and any enclosing class qualifiers from a class name.
fn simple_class_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '.' || c == '$').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(TypeDesc::Primitive(PrimitiveKind::Int).canonical_name(), "int");
        assert_eq!(TypeDesc::string().canonical_name(), "java.lang.String");
        assert_eq!(
            TypeDesc::array_of(TypeDesc::array_of(TypeDesc::string())).canonical_name(),
            "java.lang.String[][]"
        );
    }

    #[test]
    fn simple_names_strip_packages_and_outer_classes() {
        assert_eq!(TypeDesc::class("java.util.ArrayList").simple_name(), "ArrayList");
        assert_eq!(TypeDesc::class("com.acme.Outer$Inner").simple_name(), "Inner");
        assert_eq!(TypeDesc::class("Bare").simple_name(), "Bare");
        assert_eq!(
            TypeDesc::array_of(TypeDesc::Primitive(PrimitiveKind::Long)).simple_name(),
            "long[]"
        );
    }

    #[test]
    fn scalar_classification() {
        assert!(TypeDesc::Primitive(PrimitiveKind::Char).is_scalar());
        assert!(TypeDesc::class("java.lang.Integer").is_scalar());
        assert!(TypeDesc::string().is_scalar());
        assert!(!TypeDesc::object().is_scalar());
        assert!(!TypeDesc::array_of(TypeDesc::string()).is_scalar());
        assert!(!TypeDesc::class("java.lang.Integer").is_primitive());
    }

    #[test]
    fn keyword_lookup() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_keyword("String"), None);
    }

    #[test]
    fn arrays_serialize_flat() {
        let ty = TypeDesc::array_of(TypeDesc::array_of(TypeDesc::string()));
        assert_eq!(ty.dimensions(), 2);
        assert_eq!(ty.element(), &TypeDesc::string());

        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "element": { "Class": "java.lang.String" }, "dimensions": 2 })
        );
        let back: TypeDesc = serde_json::from_value(json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn excessive_dimensions_are_rejected() {
        let json = serde_json::json!({ "element": { "Primitive": "Int" }, "dimensions": 400000 });
        let err = serde_json::from_value::<TypeDesc>(json).unwrap_err();
        assert!(err.to_string().contains("400000"));

        let json = serde_json::json!({ "element": { "Primitive": "Int" }, "dimensions": 255 });
        let ty: TypeDesc = serde_json::from_value(json).unwrap();
        assert_eq!(ty.dimensions(), MAX_ARRAY_DIMENSIONS);
    }

    #[test]
    fn display_is_canonical_name() {
        let ty = TypeDesc::array_of(TypeDesc::Primitive(PrimitiveKind::Byte));
        assert_eq!(ty.to_string(), "byte[]");
    }
}
