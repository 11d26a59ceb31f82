// Core modules implementing type description, schema compilation, decoding, and errors.
pub mod custom;
pub mod decode;
pub mod error;
pub mod schema;
pub mod shape;
