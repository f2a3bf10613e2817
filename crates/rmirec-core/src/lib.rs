pub mod error;
pub mod id;
pub mod signature;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::CoreError;
pub use id::ObjectId;
pub use signature::{mangle, MangledSignature};
pub use types::{PrimitiveKind, TypeDesc};
pub use value::{Field, FieldModifiers, FieldSlot, Heap, Object, StructObject, Value};
