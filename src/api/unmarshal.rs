//! Purpose: Convenience entry points that pair schema compilation with decoding.
//! Exports: `unmarshal`, `build_unmarshaler`, `Unmarshaler`, `cached_schema`.
//! Role: Boundary helpers for callers that do not want to manage schemas themselves.
//! Invariants: `unmarshal` recompiles on every call; the other paths compile once per type.
//! Invariants: The process-wide cache only ever holds immutable schemas.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::core::error::{DecodeErrors, Error};
use crate::core::schema::{FieldSchema, Record};

type SchemaCache = Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn cache() -> &'static SchemaCache {
    static CACHE: OnceLock<SchemaCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the process-wide compiled schema for `R`, compiling it on first use.
///
/// A compile failure is not cached; the next call tries again.
pub fn cached_schema<R: Record>() -> Result<Arc<FieldSchema<R>>, Error> {
    let mut schemas = cache().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(schema) = schemas.get(&TypeId::of::<R>()) {
        if let Ok(schema) = Arc::clone(schema).downcast::<FieldSchema<R>>() {
            return Ok(schema);
        }
    }
    let schema = Arc::new(FieldSchema::<R>::compile()?);
    schemas.insert(TypeId::of::<R>(), schema.clone());
    Ok(schema)
}

/// Compiles the schema for `R` and decodes `json` into `target` in one call.
///
/// The schema is rebuilt every time; prefer [`build_unmarshaler`] or
/// [`cached_schema`] on hot paths.
pub fn unmarshal<R: Record>(json: &[u8], target: &mut R) -> Result<Vec<&'static str>, DecodeErrors> {
    let schema = FieldSchema::<R>::compile()?;
    schema.decode(json, target)
}

/// Compiles the schema for `R` once and returns a reusable decode function.
pub fn build_unmarshaler<R: Record>()
-> Result<impl Fn(&[u8], &mut R) -> Result<Vec<&'static str>, DecodeErrors> + Send + Sync, Error> {
    let schema = FieldSchema::<R>::compile()?;
    Ok(move |json: &[u8], target: &mut R| schema.decode(json, target))
}

/// Named, cloneable form of [`build_unmarshaler`].
pub struct Unmarshaler<R> {
    schema: Arc<FieldSchema<R>>,
}

impl<R: Record> Unmarshaler<R> {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            schema: Arc::new(FieldSchema::compile()?),
        })
    }

    /// Shares the process-wide cached schema instead of compiling a new one.
    pub fn cached() -> Result<Self, Error> {
        Ok(Self {
            schema: cached_schema::<R>()?,
        })
    }
}

impl<R> Unmarshaler<R> {
    pub fn from_schema(schema: FieldSchema<R>) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &FieldSchema<R> {
        &self.schema
    }

    pub fn unmarshal(&self, json: &[u8], target: &mut R) -> Result<Vec<&'static str>, DecodeErrors> {
        self.schema.decode(json, target)
    }
}

impl<R> Clone for Unmarshaler<R> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<R> fmt::Debug for Unmarshaler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unmarshaler")
            .field("record", &self.schema.record_name())
            .field("fields", &self.schema.len())
            .finish()
    }
}
