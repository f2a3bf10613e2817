//! Source literals for scalar values.
//!
//! Text is escaped the way Java string literals require: quotes,
//! backslashes and the named control escapes use their short forms, other
//! control characters and everything outside ASCII become `\uXXXX` UTF-16
//! units. Numeric literals carry the minimal suffix that keeps their width:
//! `L` for 64-bit integers and `f` for single-precision floats. Doubles are
//! unsuffixed but always contain a decimal point or exponent.

use rmirec_core::{TypeDesc, Value};

/// Escapes `s` for embedding between double quotes.
pub fn escape_java(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c < ' ' || c >= '\u{7f}' => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// A double-quoted, escaped text literal.
pub fn string_literal(s: &str) -> String {
    format!("\"{}\"", escape_java(s))
}

/// A single-quoted, escaped character literal.
///
/// `None` for characters that need a surrogate pair: a Java `char` holds a
/// single UTF-16 unit.
pub fn char_literal(c: char) -> Option<String> {
    if c.len_utf16() > 1 {
        return None;
    }
    let escaped = match c {
        '\'' => "\\'".to_string(),
        c => escape_java(c.encode_utf8(&mut [0u8; 4])),
    };
    Some(format!("'{escaped}'"))
}

pub fn double_literal(v: f64) -> String {
    if v.is_nan() {
        "Double.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Double.POSITIVE_INFINITY".to_string()
        } else {
            "Double.NEGATIVE_INFINITY".to_string()
        }
    } else {
        // Debug formatting keeps `.0` on integral values and uses exponents
        // for very large or small magnitudes, both valid double literals.
        format!("{v:?}")
    }
}

pub fn float_literal(v: f32) -> String {
    if v.is_nan() {
        "Float.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Float.POSITIVE_INFINITY".to_string()
        } else {
            "Float.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{v:?}f")
    }
}

/// Renders an inline scalar or text value as a literal expression.
///
/// Returns `None` for values that are not scalars (null, class
/// references, heap references) and for characters [`char_literal`]
/// cannot express.
pub fn scalar_literal(value: &Value) -> Option<String> {
    let literal = match value {
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => char_literal(*c)?,
        Value::Byte(v) => format!("(byte) {v}"),
        Value::Short(v) => format!("(short) {v}"),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => format!("{v}L"),
        Value::Float(v) => float_literal(*v),
        Value::Double(v) => double_literal(*v),
        Value::Text(s) => string_literal(s),
        Value::Null | Value::Class(_) | Value::Ref(_) => return None,
    };
    Some(literal)
}

/// The declaration type for an inline scalar or text value.
pub fn scalar_type_name(value: &Value) -> Option<&'static str> {
    match value {
        Value::Text(_) => Some("String"),
        other => other.primitive_kind().map(|kind| kind.keyword()),
    }
}

/// A class-reference expression: canonical name plus `.class`.
pub fn class_literal(ty: &TypeDesc) -> String {
    format!("{}.class", ty.canonical_name())
}
