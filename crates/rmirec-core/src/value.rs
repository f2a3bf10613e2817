//! Runtime value representation for recorded arguments and results.
//!
//! [`Value`] is the dynamic counterpart to [`TypeDesc`]. Scalars, text and
//! class references are stored inline. Everything that has reference
//! identity (arrays, collections, maps, property bags and structured objects)
//! lives in a [`Heap`] arena and is referenced through [`Value::Ref`].
//!
//! Aliasing is expressed by two `Ref`s carrying the same [`ObjectId`]; a
//! cycle is a struct field (or container element) that refers back to an
//! enclosing object.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::ObjectId;
use crate::types::{PrimitiveKind, TypeDesc};

/// Canonical name of the property-bag type.
pub const PROPERTIES_CLASS: &str = "java.util.Properties";

/// Canonical name of the class-reference type.
pub const CLASS_CLASS: &str = "java.lang.Class";

/// A value observed as an argument, return value or field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    /// A reference to a class itself.
    Class(TypeDesc),
    /// Reference to an object in the owning heap.
    Ref(ObjectId),
}

impl Value {
    /// Shorthand for a text value.
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The referenced object id, if this is a [`Value::Ref`].
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// The primitive kind of an inline scalar, `None` for everything else.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::Byte(_) => Some(PrimitiveKind::Byte),
            Value::Short(_) => Some(PrimitiveKind::Short),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// The concrete runtime type of this value.
    ///
    /// Inline scalars report their boxed wrapper class, as a boxed value
    /// stored in an `Object` slot would. `Null` has no runtime type.
    pub fn runtime_type(&self, heap: &Heap) -> Result<Option<TypeDesc>, CoreError> {
        let ty = match self {
            Value::Null => return Ok(None),
            Value::Text(_) => TypeDesc::string(),
            Value::Class(_) => TypeDesc::class(CLASS_CLASS),
            Value::Ref(id) => heap.get(*id)?.runtime_type(),
            scalar => match scalar.primitive_kind() {
                Some(kind) => TypeDesc::class(kind.wrapper_class()),
                None => return Ok(None),
            },
        };
        Ok(Some(ty))
    }

    /// Returns a human-readable description of the value's shape.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Char(_) => "Char",
            Value::Byte(_) => "Byte",
            Value::Short(_) => "Short",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Text(_) => "Text",
            Value::Class(_) => "Class",
            Value::Ref(_) => "Ref",
        }
    }
}

/// A heap object: anything with reference identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// Fixed-length array with a declared component type.
    Array {
        component: TypeDesc,
        elements: Vec<Value>,
    },
    /// Ordered or unordered collection (list, set, queue...), in iteration order.
    Collection { class: String, elements: Vec<Value> },
    /// String-keyed, string-valued property bag.
    Properties(IndexMap<String, String>),
    /// General key/value map, in iteration order.
    Map {
        class: String,
        entries: Vec<(Value, Value)>,
    },
    /// Any other object, described by its fields.
    Struct(StructObject),
}

impl Object {
    /// The concrete runtime type of this object.
    pub fn runtime_type(&self) -> TypeDesc {
        match self {
            Object::Array { component, .. } => TypeDesc::array_of(component.clone()),
            Object::Collection { class, .. } | Object::Map { class, .. } => {
                TypeDesc::class(class.clone())
            }
            Object::Properties(_) => TypeDesc::class(PROPERTIES_CLASS),
            Object::Struct(s) => TypeDesc::class(s.class.clone()),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Array { .. } => "array",
            Object::Collection { .. } => "collection",
            Object::Properties(_) => "properties",
            Object::Map { .. } => "map",
            Object::Struct(_) => "struct",
        }
    }
}

/// A structured object, introspected field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructObject {
    /// Canonical class name.
    pub class: String,
    /// Whether the class can be built through a no-argument constructor.
    pub has_default_constructor: bool,
    /// Whether this object is a reference to a remote-accessible object.
    pub remote: bool,
    /// Introspectable fields, superclass fields included, in declaration order.
    pub fields: Vec<Field>,
}

impl StructObject {
    /// Creates an empty struct of `class` with a default constructor.
    pub fn new(class: impl Into<String>) -> Self {
        StructObject {
            class: class.into(),
            has_default_constructor: true,
            remote: false,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.has_default_constructor = false;
        self
    }

    /// Marks this object as a remote-accessible reference.
    pub fn as_remote(mut self) -> Self {
        self.remote = true;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}

/// Field modifiers relevant to reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModifiers {
    /// Compile-time constant (`final`).
    pub constant: bool,
    /// Shared by every instance in the process (`static`).
    pub process_wide: bool,
    /// Excluded from persistence (`transient`).
    pub transient: bool,
}

impl FieldModifiers {
    /// True if the field carries per-instance persistent state.
    pub fn is_persistent(&self) -> bool {
        !(self.constant || self.process_wide || self.transient)
    }
}

/// The observed content of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldSlot {
    Value(Value),
    /// Introspection could not read the field.
    Inaccessible,
}

/// One introspectable field of a [`StructObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Declared type of the field (not the runtime type of its value).
    pub declared: TypeDesc,
    pub modifiers: FieldModifiers,
    /// Whether values of the declared type are independently reconstructible.
    pub serializable: bool,
    pub slot: FieldSlot,
}

impl Field {
    /// A readable, persistent, serializable field.
    pub fn new(name: impl Into<String>, declared: TypeDesc, value: Value) -> Self {
        Field {
            name: name.into(),
            declared,
            modifiers: FieldModifiers::default(),
            serializable: true,
            slot: FieldSlot::Value(value),
        }
    }

    /// A field whose value could not be read.
    pub fn inaccessible(name: impl Into<String>, declared: TypeDesc) -> Self {
        Field {
            name: name.into(),
            declared,
            modifiers: FieldModifiers::default(),
            serializable: true,
            slot: FieldSlot::Inaccessible,
        }
    }

    pub fn constant(mut self) -> Self {
        self.modifiers.constant = true;
        self
    }

    pub fn process_wide(mut self) -> Self {
        self.modifiers.process_wide = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.modifiers.transient = true;
        self
    }

    pub fn not_serializable(mut self) -> Self {
        self.serializable = false;
        self
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            FieldSlot::Value(v) => Some(v),
            FieldSlot::Inaccessible => None,
        }
    }
}

/// Arena of heap objects addressed by [`ObjectId`].
///
/// Object ids are indices into the arena and are never reused; a heap only
/// grows. Graphs with cycles are built by allocating an object first and
/// patching a field or element to refer back to it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Heap::default()
    }

    /// Allocates `object` and returns its id.
    pub fn alloc(&mut self, object: Object) -> ObjectId {
        let id = ObjectId::from(self.objects.len());
        self.objects.push(object);
        id
    }

    /// Allocates `object` and returns a [`Value::Ref`] to it.
    pub fn alloc_ref(&mut self, object: Object) -> Value {
        Value::Ref(self.alloc(object))
    }

    pub fn alloc_struct(&mut self, object: StructObject) -> ObjectId {
        self.alloc(Object::Struct(object))
    }

    pub fn get(&self, id: ObjectId) -> Result<&Object, CoreError> {
        self.objects
            .get(usize::from(id))
            .ok_or(CoreError::ObjectNotFound { id })
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut Object, CoreError> {
        self.objects
            .get_mut(usize::from(id))
            .ok_or(CoreError::ObjectNotFound { id })
    }

    /// Returns the struct stored at `id`.
    pub fn get_struct(&self, id: ObjectId) -> Result<&StructObject, CoreError> {
        match self.get(id)? {
            Object::Struct(s) => Ok(s),
            _ => Err(CoreError::UnexpectedShape {
                id,
                expected: "struct",
            }),
        }
    }

    /// Overwrites the value of field `name` on the struct at `id`.
    pub fn set_field(&mut self, id: ObjectId, name: &str, value: Value) -> Result<(), CoreError> {
        let object = match self.get_mut(id)? {
            Object::Struct(s) => s,
            _ => {
                return Err(CoreError::UnexpectedShape {
                    id,
                    expected: "struct",
                })
            }
        };
        let class = object.class.clone();
        let field = object
            .field_mut(name)
            .ok_or_else(|| CoreError::FieldNotFound {
                class,
                name: name.to_string(),
            })?;
        field.slot = FieldSlot::Value(value);
        Ok(())
    }

    /// Appends `value` to the array or collection at `id`.
    pub fn push_element(&mut self, id: ObjectId, value: Value) -> Result<(), CoreError> {
        match self.get_mut(id)? {
            Object::Array { elements, .. } | Object::Collection { elements, .. } => {
                elements.push(value);
                Ok(())
            }
            _ => Err(CoreError::UnexpectedShape {
                id,
                expected: "array or collection",
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Checks that `roots` and every object in the heap only refer to
    /// objects of this heap, and that every character value fits in one
    /// UTF-16 unit.
    ///
    /// Objects are checked in a single pass over the arena, so arbitrarily
    /// long chains do not deepen the stack.
    pub fn validate<'v>(
        &self,
        roots: impl IntoIterator<Item = &'v Value>,
    ) -> Result<(), CoreError> {
        for root in roots {
            self.check_value(root)?;
        }
        for object in &self.objects {
            match object {
                Object::Array { elements, .. } | Object::Collection { elements, .. } => {
                    for element in elements {
                        self.check_value(element)?;
                    }
                }
                Object::Map { entries, .. } => {
                    for (key, value) in entries {
                        self.check_value(key)?;
                        self.check_value(value)?;
                    }
                }
                Object::Struct(object) => {
                    for value in object.fields.iter().filter_map(Field::value) {
                        self.check_value(value)?;
                    }
                }
                Object::Properties(_) => {}
            }
        }
        Ok(())
    }

    fn check_value(&self, value: &Value) -> Result<(), CoreError> {
        match value {
            Value::Ref(id) if usize::from(*id) >= self.objects.len() => {
                Err(CoreError::ObjectNotFound { id: *id })
            }
            Value::Char(c) if c.len_utf16() > 1 => Err(CoreError::CharOutsideBmp(*c)),
            _ => Ok(()),
        }
    }

    /// Iterates objects in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(idx, object)| (ObjectId::from(idx), object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(value: i32) -> StructObject {
        StructObject::new("com.acme.Node")
            .with_field(Field::new(
                "value",
                TypeDesc::Primitive(PrimitiveKind::Int),
                Value::Int(value),
            ))
            .with_field(Field::new("next", TypeDesc::class("com.acme.Node"), Value::Null))
    }

    #[test]
    fn alloc_and_get() {
        let mut heap = Heap::new();
        let id = heap.alloc_struct(node(1));
        assert_eq!(heap.len(), 1);
        let s = heap.get_struct(id).unwrap();
        assert_eq!(s.field("value").unwrap().value(), Some(&Value::Int(1)));
    }

    #[test]
    fn missing_object_is_an_error() {
        let heap = Heap::new();
        let err = heap.get(ObjectId(3)).unwrap_err();
        assert!(matches!(err, CoreError::ObjectNotFound { id } if id == ObjectId(3)));
    }

    #[test]
    fn cycle_built_by_patching_field() {
        let mut heap = Heap::new();
        let id = heap.alloc_struct(node(1));
        heap.set_field(id, "next", Value::Ref(id)).unwrap();
        let s = heap.get_struct(id).unwrap();
        assert_eq!(s.field("next").unwrap().value(), Some(&Value::Ref(id)));
    }

    #[test]
    fn set_field_rejects_unknown_field_and_non_struct() {
        let mut heap = Heap::new();
        let id = heap.alloc_struct(node(1));
        assert!(matches!(
            heap.set_field(id, "missing", Value::Null),
            Err(CoreError::FieldNotFound { .. })
        ));

        let list = heap.alloc(Object::Collection {
            class: "java.util.ArrayList".into(),
            elements: vec![],
        });
        assert!(matches!(
            heap.set_field(list, "value", Value::Null),
            Err(CoreError::UnexpectedShape { .. })
        ));
        heap.push_element(list, Value::Int(4)).unwrap();
        assert!(matches!(
            heap.get(list).unwrap(),
            Object::Collection { elements, .. } if elements == &vec![Value::Int(4)]
        ));
    }

    #[test]
    fn runtime_types() {
        let mut heap = Heap::new();
        let arr = heap.alloc_ref(Object::Array {
            component: TypeDesc::Primitive(PrimitiveKind::Int),
            elements: vec![Value::Int(1)],
        });
        let props = heap.alloc_ref(Object::Properties(IndexMap::new()));

        assert_eq!(Value::Null.runtime_type(&heap).unwrap(), None);
        assert_eq!(
            Value::Long(5).runtime_type(&heap).unwrap(),
            Some(TypeDesc::class("java.lang.Long"))
        );
        assert_eq!(
            Value::text("x").runtime_type(&heap).unwrap(),
            Some(TypeDesc::string())
        );
        assert_eq!(
            arr.runtime_type(&heap).unwrap().unwrap().canonical_name(),
            "int[]"
        );
        assert_eq!(
            props.runtime_type(&heap).unwrap().unwrap().canonical_name(),
            PROPERTIES_CLASS
        );
    }

    #[test]
    fn field_modifiers_persistence() {
        assert!(FieldModifiers::default().is_persistent());
        let f = Field::new("x", TypeDesc::string(), Value::Null).transient();
        assert!(!f.modifiers.is_persistent());
        let f = Field::new("x", TypeDesc::string(), Value::Null).constant();
        assert!(!f.modifiers.is_persistent());
        let f = Field::new("x", TypeDesc::string(), Value::Null).process_wide();
        assert!(!f.modifiers.is_persistent());
    }

    #[test]
    fn validate_accepts_cycles_and_rejects_dangling_refs() {
        let mut heap = Heap::new();
        let id = heap.alloc_struct(node(1));
        heap.set_field(id, "next", Value::Ref(id)).unwrap();
        heap.validate([&Value::Ref(id), &Value::Char('é')]).unwrap();

        let err = heap.validate([&Value::Ref(ObjectId(5))]).unwrap_err();
        assert!(matches!(err, CoreError::ObjectNotFound { id } if id == ObjectId(5)));

        heap.alloc(Object::Map {
            class: "java.util.HashMap".into(),
            entries: vec![(Value::text("k"), Value::Ref(ObjectId(9)))],
        });
        assert!(matches!(
            heap.validate([]),
            Err(CoreError::ObjectNotFound { id }) if id == ObjectId(9)
        ));
    }

    #[test]
    fn validate_rejects_chars_outside_one_utf16_unit() {
        let mut heap = Heap::new();
        heap.alloc(Object::Collection {
            class: "java.util.ArrayList".into(),
            elements: vec![Value::Char('😀')],
        });
        let err = heap.validate([]).unwrap_err();
        assert!(matches!(err, CoreError::CharOutsideBmp('😀')));
        assert!(err.to_string().contains("'😀'"));
    }

    #[test]
    fn heap_serde_roundtrip() {
        let mut heap = Heap::new();
        let id = heap.alloc_struct(node(9));
        heap.set_field(id, "next", Value::Ref(id)).unwrap();
        let json = serde_json::to_string(&heap).unwrap();
        let back: Heap = serde_json::from_str(&json).unwrap();
        assert_eq!(heap, back);
    }
}
