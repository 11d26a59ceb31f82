//! Purpose: Decode JSON objects into typed records while tracking which fields were supplied.
//! Exports: `api` surface re-exported at the root, plus the `record!`, `opaque!`, `custom!` macros.
//! Role: Library for PATCH-style partial updates where absent and explicit null must differ.
//! Invariants: Field schemas are compiled once per record type and never mutated afterwards.
//! Invariants: A decode pass reports either the modified field names or every field error, never both.
pub mod api;
pub mod core;
mod json;
mod macros;

pub use api::*;
