// Selective decoder: applies the matched top-level members of a payload to a record.
use serde_json::value::RawValue;
use tracing::{debug, trace};

use crate::core::error::{DecodeErrors, Error, ErrorKind};
use crate::core::schema::{FieldDescriptor, FieldSchema, NumericClass};
use crate::core::shape::{FieldValue, Kind};
use crate::json::parse::{self, ValueKind};

impl<R> FieldSchema<R> {
    /// Decodes `json` into `target` and returns the declared names of the
    /// fields the payload supplied, in schema order.
    ///
    /// Keys the schema does not know are ignored. A field-level failure does
    /// not stop the pass: the remaining fields are still applied and every
    /// failure is returned together. Fields applied before or after a failing
    /// field keep their new values, so `target` may be partially updated when
    /// an error is returned.
    pub fn decode(&self, json: &[u8], target: &mut R) -> Result<Vec<&'static str>, DecodeErrors> {
        let members = parse::scan_object(json).map_err(|err| {
            Error::new(ErrorKind::MalformedPayload)
                .with_message(format!(
                    "{} payload rejected ({})",
                    self.record_name(),
                    parse::category(&err)
                ))
                .with_source(err)
        })?;

        let mut present: Vec<Option<&RawValue>> = vec![None; self.entries.len()];
        for (key, raw) in members.0 {
            if let Some(&idx) = self.by_key.get(key.as_str()) {
                present[idx] = Some(raw);
            }
        }

        let mut modified = Vec::with_capacity(self.entries.len());
        let mut errors = DecodeErrors::new();
        for (entry, raw) in self.entries.iter().zip(present) {
            let Some(raw) = raw else {
                continue;
            };
            let descriptor = &entry.descriptor;
            let applied = field_value(descriptor, raw)
                .and_then(|value| (entry.assign)(&mut *target, value));
            match applied {
                Ok(()) => {
                    trace!(record = self.record_name(), field = descriptor.name, "field applied");
                    modified.push(descriptor.name);
                }
                Err(err) => {
                    errors.push(err.with_field(descriptor.name).with_key(descriptor.json_key));
                }
            }
        }

        if errors.is_empty() {
            return Ok(modified);
        }
        debug!(
            record = self.record_name(),
            errors = errors.len(),
            "decode finished with field errors"
        );
        Err(errors)
    }
}

/// Free-function form of [`FieldSchema::decode`].
pub fn decode<R>(
    schema: &FieldSchema<R>,
    json: &[u8],
    target: &mut R,
) -> Result<Vec<&'static str>, DecodeErrors> {
    schema.decode(json, target)
}

fn field_value<'a>(descriptor: &FieldDescriptor, raw: &'a RawValue) -> Result<FieldValue<'a>, Error> {
    let kind = parse::value_kind(raw);
    match kind {
        ValueKind::String if descriptor.custom_decoder => Ok(FieldValue::Quoted(raw.get())),
        ValueKind::String => {
            expect_kind(descriptor, Kind::String, kind)?;
            parse::parse_string(raw)
                .map(FieldValue::Str)
                .map_err(|err| unexpected(kind).with_source(err))
        }
        ValueKind::Number => match descriptor.numeric_class {
            NumericClass::Signed => parse::parse_i64(raw)
                .map(FieldValue::Int)
                .map_err(|err| number_mismatch(descriptor, raw, err)),
            NumericClass::Unsigned => parse::parse_u64(raw)
                .map(FieldValue::Uint)
                .map_err(|err| number_mismatch(descriptor, raw, err)),
            NumericClass::Float => parse::parse_f64(raw)
                .map(FieldValue::Float)
                .map_err(|err| number_mismatch(descriptor, raw, err)),
            NumericClass::None => Err(type_mismatch(descriptor, kind)),
        },
        ValueKind::Object | ValueKind::Array => Ok(FieldValue::Json(raw.get())),
        ValueKind::Boolean => {
            expect_kind(descriptor, Kind::Bool, kind)?;
            parse::parse_bool(raw)
                .map(FieldValue::Bool)
                .map_err(|err| unexpected(kind).with_source(err))
        }
        ValueKind::Null if descriptor.nullable => Ok(FieldValue::Null),
        ValueKind::Null => Err(Error::new(ErrorKind::NullNotAllowed).with_message(format!(
            "cannot assign null to {} field {}",
            descriptor.storage_type, descriptor.name
        ))),
        ValueKind::Unknown => Err(unexpected(kind)),
    }
}

fn expect_kind(descriptor: &FieldDescriptor, expected: Kind, got: ValueKind) -> Result<(), Error> {
    if descriptor.storage_kind == expected {
        Ok(())
    } else {
        Err(type_mismatch(descriptor, got))
    }
}

fn type_mismatch(descriptor: &FieldDescriptor, got: ValueKind) -> Error {
    Error::new(ErrorKind::TypeMismatch).with_message(format!(
        "expected {} for field {}, got {}",
        descriptor.storage_type,
        descriptor.name,
        got.label()
    ))
}

fn number_mismatch(descriptor: &FieldDescriptor, raw: &RawValue, err: serde_json::Error) -> Error {
    Error::new(ErrorKind::TypeMismatch)
        .with_message(format!(
            "expected {} for field {}, got Number {}",
            descriptor.storage_type,
            descriptor.name,
            raw.get()
        ))
        .with_source(err)
}

fn unexpected(kind: ValueKind) -> Error {
    Error::new(ErrorKind::UnexpectedValueKind)
        .with_message(format!("unexpected JSON value kind {}", kind.label()))
}
