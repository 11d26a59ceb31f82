//! Purpose: Pair a decoded record with the list of fields its payload supplied.
//! Exports: `Modifiable`, `Tracked`.
//! Role: Serde-facing wrapper so tracked records can appear inside larger payloads.
//! Invariants: The modified list always belongs to the most recent successful decode.
//! Invariants: Decoding goes through the process-wide cached schema for the record type.

use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::de::{Deserialize, Deserializer, Error as _};
use serde_json::value::RawValue;

use crate::api::unmarshal::cached_schema;
use crate::core::error::DecodeErrors;
use crate::core::schema::Record;

/// Implemented by values that know which of their fields were populated from JSON.
pub trait Modifiable {
    fn modified(&self) -> &[&'static str];

    fn is_modified(&self, field: &str) -> bool {
        self.modified().iter().any(|name| *name == field)
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct Tracked<R> {
    value: R,
    modified: Vec<&'static str>,
}

impl<R> Tracked<R> {
    /// Wraps an existing value with an empty modified list.
    pub fn new(value: R) -> Self {
        Self {
            value,
            modified: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.value
    }

    pub fn into_parts(self) -> (R, Vec<&'static str>) {
        (self.value, self.modified)
    }
}

impl<R: Record> Tracked<R> {
    /// Applies a partial update on top of the current value.
    ///
    /// On success the modified list is replaced by the fields this payload
    /// supplied. On failure the list is cleared and the value may be partially
    /// updated.
    pub fn patch(&mut self, json: &[u8]) -> Result<&[&'static str], DecodeErrors> {
        self.modified.clear();
        let schema = cached_schema::<R>()?;
        self.modified = schema.decode(json, &mut self.value)?;
        Ok(&self.modified)
    }
}

impl<R: Record + Default> Tracked<R> {
    pub fn from_slice(json: &[u8]) -> Result<Self, DecodeErrors> {
        let mut tracked = Self::new(R::default());
        tracked.patch(json)?;
        Ok(tracked)
    }
}

impl<R> Modifiable for Tracked<R> {
    fn modified(&self) -> &[&'static str] {
        &self.modified
    }
}

impl<R> Deref for Tracked<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.value
    }
}

impl<R> DerefMut for Tracked<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.value
    }
}

impl<R: fmt::Debug> fmt::Debug for Tracked<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("value", &self.value)
            .field("modified", &self.modified)
            .finish()
    }
}

/// Only works with `serde_json` deserializers, since the payload is captured
/// as a raw JSON value first.
impl<'de, R: Record + Default> Deserialize<'de> for Tracked<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_slice(raw.get().as_bytes()).map_err(D::Error::custom)
    }
}
