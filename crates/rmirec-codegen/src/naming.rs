//! Variable names derived from runtime types.

use rmirec_core::{CoreError, Heap, TypeDesc, Value};

/// Name used for variables holding a null value.
pub const NULL_VARIABLE: &str = "value";

/// Lowercases the first character of `name`, leaving names that start with
/// two uppercase characters (acronyms such as `URL`) unchanged.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if let Some(second) = chars.clone().next() {
        if first.is_uppercase() && second.is_uppercase() {
            return name.to_string();
        }
    }
    first.to_lowercase().chain(chars).collect()
}

/// Base name for a value of type `ty`: the decapitalized simple name, with
/// each array dimension spelled `Array`.
pub fn variable_name_for_type(ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Array(component) => {
            format!("{}Array", variable_name_for_type(component))
        }
        other => decapitalize(&other.simple_name()),
    }
}

/// Base name for a variable holding `value`.
///
/// Null gets [`NULL_VARIABLE`], scalars use their boxed wrapper name
/// (`integer`, `character`), arrays are named after their component type
/// (`intArray`, `stringArray`).
pub fn variable_name_for(heap: &Heap, value: &Value) -> Result<String, CoreError> {
    Ok(match value.runtime_type(heap)? {
        Some(ty) => variable_name_for_type(&ty),
        None => NULL_VARIABLE.to_string(),
    })
}
