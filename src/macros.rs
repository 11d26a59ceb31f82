// Declarative helpers for describing records and field types.

/// Implements [`Record`](crate::Record) for a struct by listing its fields in
/// declaration order. A field may carry a tag: `name = "key,opts"` or
/// `name = "-"` to exclude it.
///
/// ```
/// #[derive(Default)]
/// struct Person {
///     first_name: Option<String>,
///     age: Option<i32>,
///     secret: String,
/// }
///
/// modtrack::record!(Person {
///     first_name = "firstName",
///     age,
///     secret = "-",
/// });
///
/// let mut person = Person::default();
/// let modified = modtrack::unmarshal(br#"{"firstName":null,"age":3}"#, &mut person).unwrap();
/// assert_eq!(modified, vec!["first_name", "age"]);
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ident { $($field:ident $(= $tag:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            const NAME: &'static str = stringify!($ty);

            fn describe(fields: &mut $crate::Fields<Self>) {
                $(
                    let _field = fields.field(stringify!($field), |record: &mut Self| &mut record.$field);
                    $( _field.tag($tag); )?
                )*
            }
        }
    };
}

/// Implements [`Reflect`](crate::Reflect) for nested types that serde decodes
/// as a whole. Their own fields are not tracked.
#[macro_export]
macro_rules! opaque {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                const SHAPE: $crate::Shape = $crate::Shape::new(stringify!($ty), $crate::Kind::Struct);

                fn decode(value: $crate::FieldValue<'_>) -> ::std::result::Result<Self, $crate::Error> {
                    value.deserialize(stringify!($ty))
                }
            }
        )+
    };
}

/// Implements [`Reflect`](crate::Reflect) for types that decode themselves
/// through [`UnmarshalJson`](crate::UnmarshalJson).
#[macro_export]
macro_rules! custom {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                const SHAPE: $crate::Shape =
                    $crate::Shape::new(stringify!($ty), $crate::Kind::Struct).with_custom_decoder();

                fn decode(value: $crate::FieldValue<'_>) -> ::std::result::Result<Self, $crate::Error> {
                    $crate::decode_custom(stringify!($ty), value)
                }
            }
        )+
    };
}
