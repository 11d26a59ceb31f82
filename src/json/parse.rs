//! Purpose: Scan the top level of a JSON object and classify raw member values.
//! Exports: `scan_object`, `Members`, `value_kind`, `ValueKind`, `category`, and the `parse_*` helpers.
//! Role: Parser boundary that keeps serde_json raw-value details out of the decoder.
//! Invariants: Member values are borrowed from the input; nothing below the top level is parsed.
//! Invariants: Number parsers never route through a wider or lossy intermediate type.
//! Notes: Error mapping is done by callsites so field context stays explicit.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ValueKind {
    String,
    Number,
    Object,
    Array,
    Boolean,
    Null,
    Unknown,
}

/// Top-level members of a JSON object in payload order, duplicates kept.
pub(crate) struct Members<'a>(pub(crate) Vec<(String, &'a RawValue)>);

impl<'de> Deserialize<'de> for Members<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MembersVisitor;

        impl<'de> Visitor<'de> for MembersVisitor {
            type Value = Members<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut members = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, &'de RawValue>()? {
                    members.push((key, value));
                }
                Ok(Members(members))
            }
        }

        deserializer.deserialize_map(MembersVisitor)
    }
}

pub(crate) fn scan_object(input: &[u8]) -> Result<Members<'_>, serde_json::Error> {
    serde_json::from_slice(input)
}

pub(crate) fn value_kind(raw: &RawValue) -> ValueKind {
    match raw.get().trim_start().as_bytes().first() {
        Some(b'"') => ValueKind::String,
        Some(b'{') => ValueKind::Object,
        Some(b'[') => ValueKind::Array,
        Some(b't' | b'f') => ValueKind::Boolean,
        Some(b'n') => ValueKind::Null,
        Some(b'-' | b'0'..=b'9') => ValueKind::Number,
        _ => ValueKind::Unknown,
    }
}

impl ValueKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            ValueKind::String => "String",
            ValueKind::Number => "Number",
            ValueKind::Object => "Object",
            ValueKind::Array => "Array",
            ValueKind::Boolean => "Boolean",
            ValueKind::Null => "Null",
            ValueKind::Unknown => "Unknown",
        }
    }
}

// serde_json reads `-0` as a float; it is still a valid integer literal.
fn is_negative_zero(raw: &RawValue) -> bool {
    raw.get().trim() == "-0"
}

pub(crate) fn parse_i64(raw: &RawValue) -> Result<i64, serde_json::Error> {
    if is_negative_zero(raw) {
        return Ok(0);
    }
    serde_json::from_str(raw.get())
}

pub(crate) fn parse_u64(raw: &RawValue) -> Result<u64, serde_json::Error> {
    if is_negative_zero(raw) {
        return Ok(0);
    }
    serde_json::from_str(raw.get())
}

pub(crate) fn parse_f64(raw: &RawValue) -> Result<f64, serde_json::Error> {
    serde_json::from_str(raw.get())
}

pub(crate) fn parse_string(raw: &RawValue) -> Result<String, serde_json::Error> {
    serde_json::from_str(raw.get())
}

pub(crate) fn parse_bool(raw: &RawValue) -> Result<bool, serde_json::Error> {
    serde_json::from_str(raw.get())
}

/// Short category label for a payload-level parse failure.
pub(crate) fn category(err: &serde_json::Error) -> &'static str {
    match err.classify() {
        serde_json::error::Category::Io => "io",
        serde_json::error::Category::Syntax => "syntax",
        serde_json::error::Category::Data => "not-an-object",
        serde_json::error::Category::Eof => "truncated",
    }
}

#[cfg(test)]
mod tests {
    use super::{ValueKind, category, parse_f64, parse_i64, parse_u64, scan_object, value_kind};

    #[test]
    fn members_keep_order_and_duplicates() {
        let members = scan_object(br#"{"b":1,"a":"x","b":null}"#).unwrap().0;
        let keys: Vec<&str> = members.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
        assert_eq!(members[2].1.get(), "null");
    }

    #[test]
    fn escaped_keys_are_unescaped() {
        let members = scan_object(br#"{"fir\u0073t":1}"#).unwrap().0;
        assert_eq!(members[0].0, "first");
    }

    #[test]
    fn classifies_raw_values() {
        let members =
            scan_object(br#"{"s":"x","n":-1.5,"o":{},"a":[],"t":true,"f":false,"z":null}"#)
                .unwrap()
                .0;
        let kinds: Vec<ValueKind> = members.iter().map(|(_, raw)| value_kind(raw)).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::String,
                ValueKind::Number,
                ValueKind::Object,
                ValueKind::Array,
                ValueKind::Boolean,
                ValueKind::Boolean,
                ValueKind::Null,
            ]
        );
    }

    #[test]
    fn non_objects_are_rejected() {
        let err = scan_object(b"[1,2]").err().expect("array payload");
        assert_eq!(category(&err), "not-an-object");
        let err = scan_object(br#"{"a":"#).err().expect("truncated payload");
        assert_eq!(category(&err), "truncated");
    }

    #[test]
    fn number_parsers_are_exact() {
        let members =
            scan_object(br#"{"big":18446744073709551615,"frac":24.3,"neg":-7}"#).unwrap().0;
        assert_eq!(parse_u64(members[0].1).unwrap(), u64::MAX);
        assert!(parse_i64(members[0].1).is_err());
        assert!(parse_i64(members[1].1).is_err());
        assert_eq!(parse_f64(members[1].1).unwrap(), 24.3);
        assert!(parse_u64(members[2].1).is_err());
        assert_eq!(parse_i64(members[2].1).unwrap(), -7);
    }

    #[test]
    fn negative_zero_is_an_integer() {
        let members = scan_object(br#"{"z":-0,"zf":-0.0,"ze":-0e0}"#).unwrap().0;
        assert_eq!(parse_i64(members[0].1).unwrap(), 0);
        assert_eq!(parse_u64(members[0].1).unwrap(), 0);
        assert!(parse_i64(members[1].1).is_err());
        assert!(parse_u64(members[2].1).is_err());
        assert_eq!(parse_f64(members[0].1).unwrap(), 0.0);
    }
}
