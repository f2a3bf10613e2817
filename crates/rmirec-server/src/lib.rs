//! HTTP recording controller for remote call records.
//!
//! Clients open a recording session against a remote target, post packed
//! call records to it, and receive the generated replay artifacts. This
//! crate contains the server state, API schema types, error handling and
//! route definitions.

pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod service;
pub mod session;
pub mod state;
