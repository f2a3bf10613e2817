//! API schema types for request/response definitions.
//!
//! Each sub-module defines the request and response types for one API
//! area. Types use serde derives for JSON serialization/deserialization.

pub mod artifacts;
pub mod records;
pub mod sessions;
