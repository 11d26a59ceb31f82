// Self-decoding field types: the `UnmarshalJson` contract and its RFC 3339 timestamp impl.
use std::error::Error as StdError;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::error::{Error, ErrorKind};
use crate::core::shape::{FieldValue, Kind, Reflect, Shape, mismatch};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Types that decode themselves from raw JSON text.
///
/// String values arrive with their surrounding quotes; objects and arrays
/// arrive verbatim. Fields of such types skip the generic string and number
/// handling entirely.
pub trait UnmarshalJson: Sized {
    fn unmarshal_json(raw: &str) -> Result<Self, BoxError>;
}

/// Runs a custom decoder and wraps its failure. Used by `Reflect` impls of
/// `UnmarshalJson` types, including the ones generated by [`custom!`](crate::custom).
pub fn decode_custom<T: UnmarshalJson>(
    type_name: &str,
    value: FieldValue<'_>,
) -> Result<T, Error> {
    let raw = match value {
        FieldValue::Quoted(raw) | FieldValue::Json(raw) => raw,
        other => return Err(mismatch(type_name, &other)),
    };
    T::unmarshal_json(raw).map_err(|err| {
        Error::new(ErrorKind::CustomDecodeFailure)
            .with_message(format!("{type_name} rejected {raw}"))
            .with_boxed_source(err)
    })
}

impl UnmarshalJson for OffsetDateTime {
    fn unmarshal_json(raw: &str) -> Result<Self, BoxError> {
        let text: String = serde_json::from_str(raw)?;
        Ok(OffsetDateTime::parse(&text, &Rfc3339)?)
    }
}

impl Reflect for OffsetDateTime {
    const SHAPE: Shape = Shape::new("OffsetDateTime", Kind::Struct).with_custom_decoder();

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        decode_custom("OffsetDateTime", value)
    }
}

#[cfg(test)]
mod tests {
    use super::{UnmarshalJson, decode_custom};
    use crate::core::error::ErrorKind;
    use crate::core::shape::FieldValue;
    use time::OffsetDateTime;

    #[test]
    fn timestamp_parses_quoted_rfc3339() {
        let ts = OffsetDateTime::unmarshal_json("\"2009-11-10T23:00:00Z\"").unwrap();
        assert_eq!(ts.unix_timestamp(), 1_257_894_000);
    }

    #[test]
    fn failure_keeps_underlying_error() {
        let err = decode_custom::<OffsetDateTime>(
            "OffsetDateTime",
            FieldValue::Quoted("\"yesterday\""),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CustomDecodeFailure);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_text_values_are_mismatches() {
        let err = decode_custom::<OffsetDateTime>("OffsetDateTime", FieldValue::Bool(true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
