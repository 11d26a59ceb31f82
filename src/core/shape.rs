// Static type descriptions (`Shape`) and the `Reflect` trait that builds field values.
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::mpsc::{Receiver, Sender, SyncSender};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Struct,
    Slice,
    Map,
    Pointer,
    Function,
    Channel,
}

/// Compile-time description of a field type.
///
/// For pointer-like types (`Option<T>`) `type_name` and `custom_decoder` are
/// taken from the pointee and `pointee` carries its kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Shape {
    pub type_name: &'static str,
    pub kind: Kind,
    pub pointee: Option<Kind>,
    pub custom_decoder: bool,
}

impl Shape {
    pub const fn new(type_name: &'static str, kind: Kind) -> Self {
        Self {
            type_name,
            kind,
            pointee: None,
            custom_decoder: false,
        }
    }

    pub const fn pointer_to(inner: Shape) -> Self {
        Self {
            type_name: inner.type_name,
            kind: Kind::Pointer,
            pointee: Some(inner.kind),
            custom_decoder: inner.custom_decoder,
        }
    }

    pub const fn with_custom_decoder(mut self) -> Self {
        self.custom_decoder = true;
        self
    }

    /// Kind after unwrapping one level of pointer indirection.
    pub const fn internal_kind(&self) -> Kind {
        match self.pointee {
            Some(kind) => kind,
            None => self.kind,
        }
    }
}

/// A JSON value that already passed the schema's type check, ready to be
/// turned into a concrete field type.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Raw JSON string literal, quotes included, for custom decoders.
    Quoted(&'a str),
    /// Raw JSON object or array text.
    Json(&'a str),
}

impl FieldValue<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldValue::Null => "Null",
            FieldValue::Bool(_) => "Boolean",
            FieldValue::Int(_) | FieldValue::Uint(_) | FieldValue::Float(_) => "Number",
            FieldValue::Str(_) | FieldValue::Quoted(_) => "String",
            FieldValue::Json(raw) if raw.starts_with('[') => "Array",
            FieldValue::Json(_) => "Object",
        }
    }

    /// Hands object/array text to serde_json for the target type.
    pub fn deserialize<T: DeserializeOwned>(self, type_name: &str) -> Result<T, Error> {
        match self {
            FieldValue::Json(raw) => serde_json::from_str(raw).map_err(|err| {
                Error::new(ErrorKind::TypeMismatch)
                    .with_message(format!("cannot decode {type_name} from JSON value"))
                    .with_source(err)
            }),
            other => Err(mismatch(type_name, &other)),
        }
    }
}

pub(crate) fn mismatch(type_name: &str, value: &FieldValue<'_>) -> Error {
    Error::new(ErrorKind::TypeMismatch)
        .with_message(format!("expected {type_name}, got {}", value.describe()))
}

/// A type that can be stored in a tracked field.
pub trait Reflect: Sized {
    const SHAPE: Shape;

    fn decode(value: FieldValue<'_>) -> Result<Self, Error>;
}

impl Reflect for bool {
    const SHAPE: Shape = Shape::new("bool", Kind::Bool);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl Reflect for String {
    const SHAPE: Shape = Shape::new("String", Kind::String);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Str(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

macro_rules! reflect_signed {
    ($($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                const SHAPE: Shape = Shape::new(stringify!($ty), Kind::Int);

                fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
                    match value {
                        FieldValue::Int(n) => <$ty>::try_from(n).map_err(|_| {
                            Error::new(ErrorKind::TypeMismatch)
                                .with_message(format!("{n} is out of range for {}", stringify!($ty)))
                        }),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

macro_rules! reflect_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                const SHAPE: Shape = Shape::new(stringify!($ty), Kind::Uint);

                fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
                    match value {
                        FieldValue::Uint(n) => <$ty>::try_from(n).map_err(|_| {
                            Error::new(ErrorKind::TypeMismatch)
                                .with_message(format!("{n} is out of range for {}", stringify!($ty)))
                        }),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

reflect_signed!(i8, i16, i32, i64, isize);
reflect_unsigned!(u8, u16, u32, u64, usize);

impl Reflect for f64 {
    const SHAPE: Shape = Shape::new("f64", Kind::Float);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Float(n) => Ok(n),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl Reflect for f32 {
    const SHAPE: Shape = Shape::new("f32", Kind::Float);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Float(n) if n.is_finite() && n.abs() > f32::MAX as f64 => {
                Err(Error::new(ErrorKind::TypeMismatch)
                    .with_message(format!("{n} is out of range for f32")))
            }
            FieldValue::Float(n) => Ok(n as f32),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    const SHAPE: Shape = Shape::pointer_to(T::SHAPE);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    const SHAPE: Shape = T::SHAPE;

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        T::decode(value).map(Box::new)
    }
}

impl<T: DeserializeOwned> Reflect for Vec<T> {
    const SHAPE: Shape = Shape::new("Vec", Kind::Slice);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Null => Ok(Vec::new()),
            other => other.deserialize("Vec"),
        }
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
    S: BuildHasher + Default,
{
    const SHAPE: Shape = Shape::new("HashMap", Kind::Map);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Null => Ok(HashMap::default()),
            other => other.deserialize("HashMap"),
        }
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    const SHAPE: Shape = Shape::new("BTreeMap", Kind::Map);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Null => Ok(BTreeMap::new()),
            other => other.deserialize("BTreeMap"),
        }
    }
}

impl Reflect for Map<String, Value> {
    const SHAPE: Shape = Shape::new("Map", Kind::Map);

    fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
        match value {
            FieldValue::Null => Ok(Map::new()),
            other => other.deserialize("Map"),
        }
    }
}

// Function and channel fields are never tracked; the schema compiler drops
// them before any value can reach `decode`.
macro_rules! reflect_untracked {
    ($kind:expr, $name:literal, [$($generics:tt)*], $ty:ty) => {
        impl<$($generics)*> Reflect for $ty {
            const SHAPE: Shape = Shape::new($name, $kind);

            fn decode(value: FieldValue<'_>) -> Result<Self, Error> {
                Err(mismatch($name, &value))
            }
        }
    };
}

reflect_untracked!(Kind::Function, "fn", [R], fn() -> R);
reflect_untracked!(Kind::Function, "fn", [A, R], fn(A) -> R);
reflect_untracked!(Kind::Function, "fn", [A, B, R], fn(A, B) -> R);
reflect_untracked!(Kind::Channel, "Sender", [T], Sender<T>);
reflect_untracked!(Kind::Channel, "SyncSender", [T], SyncSender<T>);
reflect_untracked!(Kind::Channel, "Receiver", [T], Receiver<T>);
