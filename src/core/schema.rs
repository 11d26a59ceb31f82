// Field schema compilation: records describe their fields once, the compiler classifies them.
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::core::error::{Error, ErrorKind};
use crate::core::shape::{FieldValue, Kind, Reflect, Shape};

pub(crate) type Assign<R> = Box<dyn Fn(&mut R, FieldValue<'_>) -> Result<(), Error> + Send + Sync>;

/// A record type whose top-level fields can be tracked.
///
/// Implementations register every declared field, in declaration order, with
/// [`Fields::field`]. Most records use the [`record!`](crate::record) macro.
pub trait Record: Sized + 'static {
    const NAME: &'static str;
    const KIND: Kind = Kind::Struct;

    fn describe(fields: &mut Fields<Self>);
}

/// One declared field as registered by [`Record::describe`].
pub struct FieldDef<R> {
    name: &'static str,
    tag: Option<&'static str>,
    shape: Shape,
    assign: Assign<R>,
}

impl<R> FieldDef<R> {
    /// Sets the field annotation: `"key"`, `"key,opts"`, `",opts"` or `"-"`.
    pub fn tag(&mut self, tag: &'static str) -> &mut Self {
        self.tag = Some(tag);
        self
    }
}

pub struct Fields<R> {
    defs: Vec<FieldDef<R>>,
}

impl<R: 'static> Fields<R> {
    fn new() -> Self {
        Self { defs: Vec::new() }
    }

    pub fn field<F, A>(&mut self, name: &'static str, access: A) -> &mut FieldDef<R>
    where
        F: Reflect + 'static,
        A: Fn(&mut R) -> &mut F + Send + Sync + 'static,
    {
        let assign: Assign<R> = Box::new(move |record: &mut R, value: FieldValue<'_>| {
            let decoded = F::decode(value)?;
            *access(record) = decoded;
            Ok(())
        });
        self.defs.push(FieldDef {
            name,
            tag: None,
            shape: F::SHAPE,
            assign,
        });
        let last = self.defs.len() - 1;
        &mut self.defs[last]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeclaredKind {
    Scalar,
    PointerToScalar,
    PointerToStruct,
    Slice,
    Map,
    Struct,
    CustomDecodable,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumericClass {
    None,
    Signed,
    Unsigned,
    Float,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub json_key: &'static str,
    pub declared_kind: DeclaredKind,
    pub storage_type: &'static str,
    pub storage_kind: Kind,
    pub numeric_class: NumericClass,
    pub nullable: bool,
    pub custom_decoder: bool,
}

/// What to do when two fields resolve to the same JSON key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DuplicateKeys {
    #[default]
    Reject,
    /// The later field takes the key; the earlier one can no longer match.
    ShadowEarlier,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CompileOptions {
    pub duplicate_keys: DuplicateKeys,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }
}

pub(crate) struct Entry<R> {
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) assign: Assign<R>,
}

/// Compiled, immutable description of a record type's trackable fields.
pub struct FieldSchema<R> {
    record: &'static str,
    pub(crate) entries: Vec<Entry<R>>,
    pub(crate) by_key: HashMap<&'static str, usize>,
}

impl<R: Record> FieldSchema<R> {
    pub fn compile() -> Result<Self, Error> {
        Self::compile_with(CompileOptions::new())
    }

    pub fn compile_with(options: CompileOptions) -> Result<Self, Error> {
        if R::KIND != Kind::Struct {
            return Err(Error::new(ErrorKind::InvalidTargetKind).with_message(format!(
                "{} is a {:?}, only struct records can be tracked",
                R::NAME,
                R::KIND
            )));
        }

        let mut fields = Fields::new();
        R::describe(&mut fields);

        let mut entries: Vec<Entry<R>> = Vec::with_capacity(fields.defs.len());
        let mut by_key: HashMap<&'static str, usize> = HashMap::with_capacity(fields.defs.len());
        for def in fields.defs {
            if matches!(def.shape.kind, Kind::Function | Kind::Channel) {
                trace!(record = R::NAME, field = def.name, "skipping untrackable field");
                continue;
            }
            let Some(json_key) = resolve_key(def.name, def.tag) else {
                trace!(record = R::NAME, field = def.name, "skipping excluded field");
                continue;
            };
            if let Some(&existing) = by_key.get(json_key) {
                let earlier = entries[existing].descriptor.name;
                match options.duplicate_keys {
                    DuplicateKeys::Reject => {
                        return Err(Error::new(ErrorKind::DuplicateKey)
                            .with_message(format!(
                                "fields {earlier} and {} both bind to {json_key:?}",
                                def.name
                            ))
                            .with_field(def.name)
                            .with_key(json_key));
                    }
                    DuplicateKeys::ShadowEarlier => {
                        debug!(
                            record = R::NAME,
                            key = json_key,
                            shadowed = earlier,
                            field = def.name,
                            "duplicate key shadows earlier field"
                        );
                    }
                }
            }
            by_key.insert(json_key, entries.len());
            entries.push(Entry {
                descriptor: classify(def.name, json_key, def.shape),
                assign: def.assign,
            });
        }

        debug!(record = R::NAME, fields = entries.len(), "compiled field schema");
        Ok(Self {
            record: R::NAME,
            entries,
            by_key,
        })
    }
}

impl<R> FieldSchema<R> {
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.descriptors().find(|descriptor| descriptor.name == name)
    }

    /// Descriptor currently bound to a JSON key.
    pub fn by_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.by_key
            .get(key)
            .map(|&idx| &self.entries[idx].descriptor)
    }
}

impl<R> fmt::Debug for FieldSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("record", &self.record)
            .field(
                "fields",
                &self.entries.iter().map(|e| &e.descriptor).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// First comma-separated segment of the tag, falling back to the declared
/// name when the tag or the segment is empty. `None` means excluded.
fn resolve_key(name: &'static str, tag: Option<&'static str>) -> Option<&'static str> {
    let segment = tag
        .and_then(|tag| tag.split(',').next())
        .unwrap_or("");
    match segment {
        "-" => None,
        "" => Some(name),
        key => Some(key),
    }
}

fn classify(name: &'static str, json_key: &'static str, shape: Shape) -> FieldDescriptor {
    let storage_kind = shape.internal_kind();
    let declared_kind = if shape.custom_decoder {
        DeclaredKind::CustomDecodable
    } else {
        match shape.kind {
            Kind::Pointer => match storage_kind {
                Kind::Struct => DeclaredKind::PointerToStruct,
                Kind::Slice => DeclaredKind::Slice,
                Kind::Map => DeclaredKind::Map,
                _ => DeclaredKind::PointerToScalar,
            },
            Kind::Slice => DeclaredKind::Slice,
            Kind::Map => DeclaredKind::Map,
            Kind::Struct => DeclaredKind::Struct,
            _ => DeclaredKind::Scalar,
        }
    };
    let numeric_class = match storage_kind {
        Kind::Int => NumericClass::Signed,
        Kind::Uint => NumericClass::Unsigned,
        Kind::Float => NumericClass::Float,
        _ => NumericClass::None,
    };
    FieldDescriptor {
        name,
        json_key,
        declared_kind,
        storage_type: shape.type_name,
        storage_kind,
        numeric_class,
        nullable: matches!(shape.kind, Kind::Pointer | Kind::Slice | Kind::Map),
        custom_decoder: shape.custom_decoder,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompileOptions, DeclaredKind, DuplicateKeys, FieldSchema, Fields, NumericClass, Record,
        resolve_key,
    };
    use crate::core::error::ErrorKind;
    use crate::core::shape::Kind;
    use std::collections::HashMap;
    use std::sync::mpsc::Sender;
    use time::OffsetDateTime;

    #[allow(dead_code)]
    struct Profile {
        first_name: Option<String>,
        age: i32,
        score: Option<f64>,
        visits: u64,
        tags: Vec<String>,
        attrs: HashMap<String, String>,
        seen_at: Option<OffsetDateTime>,
        internal: String,
        callback: fn() -> bool,
        events: Sender<u8>,
    }

    impl Record for Profile {
        const NAME: &'static str = "Profile";

        fn describe(fields: &mut Fields<Self>) {
            fields
                .field("first_name", |p: &mut Self| &mut p.first_name)
                .tag("firstName,omitempty");
            fields.field("age", |p: &mut Self| &mut p.age);
            fields.field("score", |p: &mut Self| &mut p.score).tag(",omitempty");
            fields.field("visits", |p: &mut Self| &mut p.visits);
            fields.field("tags", |p: &mut Self| &mut p.tags);
            fields.field("attrs", |p: &mut Self| &mut p.attrs);
            fields.field("seen_at", |p: &mut Self| &mut p.seen_at).tag("seenAt");
            fields.field("internal", |p: &mut Self| &mut p.internal).tag("-");
            fields.field("callback", |p: &mut Self| &mut p.callback);
            fields.field("events", |p: &mut Self| &mut p.events);
        }
    }

    #[test]
    fn tag_resolution_follows_first_segment() {
        assert_eq!(resolve_key("Name", None), Some("Name"));
        assert_eq!(resolve_key("Name", Some("name")), Some("name"));
        assert_eq!(resolve_key("Name", Some("name,omitempty")), Some("name"));
        assert_eq!(resolve_key("Name", Some(",omitempty")), Some("Name"));
        assert_eq!(resolve_key("Name", Some("-")), None);
        assert_eq!(resolve_key("Name", Some("-,")), None);
    }

    #[test]
    fn compiles_in_declaration_order() {
        let schema = FieldSchema::<Profile>::compile().unwrap();
        let names: Vec<&str> = schema.descriptors().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["first_name", "age", "score", "visits", "tags", "attrs", "seen_at"]
        );
        let keys: Vec<&str> = schema.descriptors().map(|d| d.json_key).collect();
        assert_eq!(
            keys,
            vec!["firstName", "age", "score", "visits", "tags", "attrs", "seenAt"]
        );
        assert!(schema.field("internal").is_none());
        assert!(schema.field("callback").is_none());
        assert!(schema.by_key("internal").is_none());
    }

    #[test]
    fn classifies_kinds_and_numbers() {
        let schema = FieldSchema::<Profile>::compile().unwrap();

        let first = schema.field("first_name").unwrap();
        assert_eq!(first.declared_kind, DeclaredKind::PointerToScalar);
        assert_eq!(first.storage_kind, Kind::String);
        assert!(first.nullable);

        let age = schema.field("age").unwrap();
        assert_eq!(age.declared_kind, DeclaredKind::Scalar);
        assert_eq!(age.numeric_class, NumericClass::Signed);
        assert!(!age.nullable);

        assert_eq!(schema.field("score").unwrap().numeric_class, NumericClass::Float);
        assert_eq!(schema.field("visits").unwrap().numeric_class, NumericClass::Unsigned);
        assert_eq!(schema.field("tags").unwrap().declared_kind, DeclaredKind::Slice);
        assert_eq!(schema.field("attrs").unwrap().declared_kind, DeclaredKind::Map);
        assert!(schema.field("attrs").unwrap().nullable);

        let seen = schema.by_key("seenAt").unwrap();
        assert_eq!(seen.declared_kind, DeclaredKind::CustomDecodable);
        assert!(seen.custom_decoder);
        assert!(seen.nullable);
        assert_eq!(seen.storage_type, "OffsetDateTime");
    }

    #[allow(dead_code)]
    struct Optional {
        bytes: Option<Vec<u8>>,
        attrs: Option<HashMap<String, i32>>,
    }

    impl Record for Optional {
        const NAME: &'static str = "Optional";

        fn describe(fields: &mut Fields<Self>) {
            fields.field("bytes", |o: &mut Self| &mut o.bytes);
            fields.field("attrs", |o: &mut Self| &mut o.attrs);
        }
    }

    #[test]
    fn optional_collections_keep_their_kind() {
        let schema = FieldSchema::<Optional>::compile().unwrap();

        let bytes = schema.field("bytes").unwrap();
        assert_eq!(bytes.declared_kind, DeclaredKind::Slice);
        assert_eq!(bytes.storage_kind, Kind::Slice);
        assert!(bytes.nullable);

        let attrs = schema.field("attrs").unwrap();
        assert_eq!(attrs.declared_kind, DeclaredKind::Map);
        assert_eq!(attrs.storage_kind, Kind::Map);
        assert!(attrs.nullable);
    }

    #[allow(dead_code)]
    struct Clash {
        a: Option<String>,
        b: Option<String>,
    }

    impl Record for Clash {
        const NAME: &'static str = "Clash";

        fn describe(fields: &mut Fields<Self>) {
            fields.field("a", |c: &mut Self| &mut c.a).tag("name");
            fields.field("b", |c: &mut Self| &mut c.b).tag("name");
        }
    }

    #[test]
    fn duplicate_keys_rejected_by_default() {
        let err = FieldSchema::<Clash>::compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(err.field(), Some("b"));
        assert_eq!(err.key(), Some("name"));
    }

    #[test]
    fn duplicate_keys_can_shadow() {
        let options = CompileOptions::new().duplicate_keys(DuplicateKeys::ShadowEarlier);
        let schema = FieldSchema::<Clash>::compile_with(options).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.by_key("name").unwrap().name, "b");
    }

    #[allow(dead_code)]
    struct Tags(Vec<String>);

    impl Record for Tags {
        const NAME: &'static str = "Tags";
        const KIND: Kind = Kind::Slice;

        fn describe(_fields: &mut Fields<Self>) {}
    }

    #[test]
    fn non_struct_records_are_rejected() {
        let err = FieldSchema::<Tags>::compile().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTargetKind);
    }
}
