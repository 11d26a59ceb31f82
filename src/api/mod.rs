//! Purpose: Define the public Rust API boundary for modtrack.
//! Exports: Schema and decode types plus the unmarshal helpers and `Tracked` wrapper.
//! Role: Public, additive-only surface; hides the JSON scanning internals.
//! Invariants: This module is the only public path to the decoding primitives.
//! Invariants: Internal modules remain private and are not directly exposed.

mod tracked;
mod unmarshal;

pub use crate::core::custom::{BoxError, UnmarshalJson, decode_custom};
pub use crate::core::decode::decode;
pub use crate::core::error::{DecodeErrors, Error, ErrorKind};
pub use crate::core::schema::{
    CompileOptions, DeclaredKind, DuplicateKeys, FieldDef, FieldDescriptor, FieldSchema, Fields,
    NumericClass, Record,
};
pub use crate::core::shape::{FieldValue, Kind, Reflect, Shape};
pub use tracked::{Modifiable, Tracked};
pub use unmarshal::{Unmarshaler, build_unmarshaler, cached_schema, unmarshal};
