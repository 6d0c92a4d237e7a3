//! Compiled descriptors: the static, immutable view of a schema that the
//! codec walks at runtime.
//!
//! [`Schema::compile`] resolves options and names once, validates key
//! uniqueness, and precomputes the per-message key routing table so that
//! decoding a key is a single hash lookup.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::SchemaError;
use crate::options::{EnumOptions, MessagePolicy};
use crate::schema_def::{EnumDef, FieldDef, Kind, Label, MessageDef, SchemaDef};
use crate::value::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub(crate) usize);

/// What a single value of a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Scalar(Kind),
    Enum(EnumId),
    Message(MessageId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    /// Scalar with explicit presence.
    Optional,
    Repeated,
    Map { key: Kind },
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub value: ValueType,
    pub cardinality: Cardinality,
    /// `None` when the field is ignored.
    pub json_name: Option<String>,
    pub omit_empty: bool,
    pub enum_as_string: bool,
    /// Index into [`MessageDescriptor::oneofs`].
    pub oneof: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OneofDescriptor {
    pub name: String,
    /// Discriminator key; `None` when the group is ignored.
    pub json_name: Option<String>,
    pub hidden: bool,
    pub omit_empty: bool,
    /// Member field indexes, in declaration order.
    pub members: Vec<usize>,
    /// Member keys inside the discriminator object of a visible group.
    pub routes: HashMap<String, usize>,
    /// Name used for the group in error messages.
    pub type_name: String,
}

/// One position in a message's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Field(usize),
    Oneof(usize),
}

/// Where a top-level object key is dispatched on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A plain field, or a member of a hidden oneof.
    Field(usize),
    /// The discriminator key of a visible oneof.
    Oneof(usize),
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<OneofDescriptor>,
    pub layout: Vec<Slot>,
    pub routes: HashMap<String, Route>,
    pub disallow_unknown: bool,
    /// Initial output buffer capacity.
    pub buf_hint: usize,
}

impl MessageDescriptor {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn oneof_index(&self, name: &str) -> Option<usize> {
        self.oneofs.iter().position(|o| o.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    by_name: HashMap<String, i32>,
    by_number: HashMap<i32, String>,
}

impl EnumDescriptor {
    pub fn number(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }

    /// The first symbol declared for `number`.
    pub fn symbol(&self, number: i32) -> Option<&str> {
        self.by_number.get(&number).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct Schema {
    messages: Vec<MessageDescriptor>,
    enums: Vec<EnumDescriptor>,
    message_index: HashMap<String, MessageId>,
}

impl Schema {
    pub fn compile(def: &SchemaDef) -> Result<Arc<Schema>, SchemaError> {
        let mut enum_index = HashMap::new();
        for (i, e) in def.enums.iter().enumerate() {
            if enum_index.insert(e.name.clone(), EnumId(i)).is_some() {
                return Err(SchemaError::DuplicateEnum(e.name.clone()));
            }
        }
        let mut message_index = HashMap::new();
        for (i, m) in def.messages.iter().enumerate() {
            if message_index.insert(m.name.clone(), MessageId(i)).is_some() {
                return Err(SchemaError::DuplicateMessage(m.name.clone()));
            }
        }

        let enums = def
            .enums
            .iter()
            .map(compile_enum)
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = Resolver {
            def,
            enum_index: &enum_index,
            message_index: &message_index,
        };
        let messages = def
            .messages
            .iter()
            .map(|m| resolver.message(m))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            messages = messages.len(),
            enums = enums.len(),
            "compiled json schema"
        );
        Ok(Arc::new(Schema {
            messages,
            enums,
            message_index,
        }))
    }

    pub fn message_type(self: &Arc<Self>, name: &str) -> Option<MessageType> {
        let id = *self.message_index.get(name)?;
        Some(MessageType {
            schema: Arc::clone(self),
            id,
        })
    }

    pub fn message(&self, id: MessageId) -> &MessageDescriptor {
        &self.messages[id.0]
    }

    pub fn enumeration(&self, id: EnumId) -> &EnumDescriptor {
        &self.enums[id.0]
    }

    /// Type name of one value, as shown in decode errors.
    pub fn value_type_name(&self, ty: ValueType) -> String {
        match ty {
            ValueType::Scalar(kind) => scalar_type_name(kind).to_string(),
            ValueType::Enum(id) => self.enumeration(id).name.clone(),
            ValueType::Message(id) => self.message(id).name.clone(),
        }
    }

    /// Type name of a whole field slot, as shown in decode errors.
    pub fn field_type_name(&self, field: &FieldDescriptor) -> String {
        let value = self.value_type_name(field.value);
        match field.cardinality {
            Cardinality::Singular => value,
            Cardinality::Optional => format!("Option<{value}>"),
            Cardinality::Repeated => format!("Vec<{value}>"),
            Cardinality::Map { key } => {
                format!("IndexMap<{}, {value}>", scalar_type_name(key))
            }
        }
    }
}

pub(crate) fn scalar_type_name(kind: Kind) -> &'static str {
    match kind {
        Kind::String => "String",
        Kind::Bytes => "Vec<u8>",
        Kind::Bool => "bool",
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 | Kind::Enum => "i32",
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => "i64",
        Kind::Uint32 | Kind::Fixed32 => "u32",
        Kind::Uint64 | Kind::Fixed64 => "u64",
        Kind::Float => "f32",
        Kind::Double => "f64",
        Kind::Message => "message",
    }
}

/// Handle to one message type of a compiled schema.
#[derive(Clone)]
pub struct MessageType {
    schema: Arc<Schema>,
    id: MessageId,
}

impl MessageType {
    pub(crate) fn from_parts(schema: &Arc<Schema>, id: MessageId) -> Self {
        Self {
            schema: Arc::clone(schema),
            id,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        self.schema.message(self.id)
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// A zero-valued instance of this type.
    pub fn new_message(&self) -> Message {
        Message::new(self)
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.id == other.id
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.name()).finish()
    }
}

fn compile_enum(def: &EnumDef) -> Result<EnumDescriptor, SchemaError> {
    let mut by_name = HashMap::new();
    let mut by_number = HashMap::new();
    for v in &def.values {
        if by_name.insert(v.name.clone(), v.number).is_some() {
            return Err(SchemaError::DuplicateEnumSymbol {
                enum_name: def.name.clone(),
                symbol: v.name.clone(),
            });
        }
        by_number.entry(v.number).or_insert_with(|| v.name.clone());
    }
    Ok(EnumDescriptor {
        name: def.name.clone(),
        by_name,
        by_number,
    })
}

struct Resolver<'a> {
    def: &'a SchemaDef,
    enum_index: &'a HashMap<String, EnumId>,
    message_index: &'a HashMap<String, MessageId>,
}

impl Resolver<'_> {
    fn message(&self, m: &MessageDef) -> Result<MessageDescriptor, SchemaError> {
        let policy = m.options.inherit(&self.def.options).resolve();

        let mut oneofs = Vec::with_capacity(m.oneofs.len());
        for o in &m.oneofs {
            if oneofs.iter().any(|x: &OneofDescriptor| x.name == o.name) {
                return Err(SchemaError::DuplicateField {
                    message: m.name.clone(),
                    field: o.name.clone(),
                });
            }
            let resolved = o.options.resolve(&o.name, &policy);
            oneofs.push(OneofDescriptor {
                name: o.name.clone(),
                json_name: resolved.key,
                hidden: resolved.hidden,
                omit_empty: resolved.omit_empty,
                members: Vec::new(),
                routes: HashMap::new(),
                type_name: crate::options::upper_camel_case(&o.name),
            });
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(m.fields.len());
        for (i, f) in m.fields.iter().enumerate() {
            if fields.iter().any(|x| x.name == f.name) {
                return Err(SchemaError::DuplicateField {
                    message: m.name.clone(),
                    field: f.name.clone(),
                });
            }
            let field = self.field(m, f, &policy, &oneofs)?;
            if let Some(o) = field.oneof {
                oneofs[o].members.push(i);
            }
            fields.push(field);
        }

        if let Some(empty) = oneofs.iter().find(|o| o.members.is_empty()) {
            return Err(SchemaError::EmptyOneof {
                message: m.name.clone(),
                oneof: empty.name.clone(),
            });
        }

        let mut layout = Vec::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            match f.oneof {
                None => layout.push(Slot::Field(i)),
                Some(o) if oneofs[o].members[0] == i => layout.push(Slot::Oneof(o)),
                Some(_) => {}
            }
        }

        let mut keys = KeySpace::new(&m.name, m.name.clone());
        for slot in &layout {
            match *slot {
                Slot::Field(i) => keys.insert(&fields[i], Route::Field(i))?,
                Slot::Oneof(o) => {
                    let group = &oneofs[o];
                    let Some(key) = group.json_name.clone() else {
                        continue;
                    };
                    if group.hidden {
                        for &member in &group.members {
                            keys.insert(&fields[member], Route::Field(member))?;
                        }
                        continue;
                    }
                    keys.insert_key(&group.name, key, Route::Oneof(o))?;
                    let mut inner = KeySpace::new(&m.name, format!("{}.{}", m.name, group.name));
                    for &member in &group.members {
                        inner.insert(&fields[member], member)?;
                    }
                    oneofs[o].routes = inner.routes;
                }
            }
        }

        let buf_hint = keys.routes.keys().map(|k| k.len() + 2).sum::<usize>() * 2 + 2;

        Ok(MessageDescriptor {
            name: m.name.clone(),
            fields,
            oneofs,
            layout,
            routes: keys.routes,
            disallow_unknown: policy.disallow_unknown_fields,
            buf_hint,
        })
    }

    fn field(
        &self,
        m: &MessageDef,
        f: &FieldDef,
        policy: &MessagePolicy,
        oneofs: &[OneofDescriptor],
    ) -> Result<FieldDescriptor, SchemaError> {
        let mut enum_options: Option<&EnumOptions> = None;
        let value = match f.kind {
            Kind::Enum => {
                let target = self.type_ref(m, f)?;
                let id = *self.enum_index.get(target).ok_or_else(|| SchemaError::UnknownEnum {
                    message: m.name.clone(),
                    field: f.name.clone(),
                    target: target.to_string(),
                })?;
                enum_options = Some(&self.def.enums[id.0].options);
                ValueType::Enum(id)
            }
            Kind::Message => {
                let target = self.type_ref(m, f)?;
                let id = *self
                    .message_index
                    .get(target)
                    .ok_or_else(|| SchemaError::UnknownMessage {
                        message: m.name.clone(),
                        field: f.name.clone(),
                        target: target.to_string(),
                    })?;
                ValueType::Message(id)
            }
            kind => ValueType::Scalar(kind),
        };

        let cardinality = match f.label {
            Label::Singular => Cardinality::Singular,
            // Bytes and messages already distinguish absent from empty.
            Label::Optional if matches!(f.kind, Kind::Bytes | Kind::Message) => {
                Cardinality::Singular
            }
            Label::Optional => Cardinality::Optional,
            Label::Repeated => Cardinality::Repeated,
            Label::Map => {
                let key = f.map_key.ok_or_else(|| SchemaError::MissingTypeRef {
                    message: m.name.clone(),
                    field: f.name.clone(),
                    kind: "map",
                })?;
                if matches!(
                    key,
                    Kind::Bytes | Kind::Float | Kind::Double | Kind::Enum | Kind::Message
                ) {
                    return Err(SchemaError::InvalidMapKey {
                        message: m.name.clone(),
                        field: f.name.clone(),
                        kind: key.as_str(),
                    });
                }
                Cardinality::Map { key }
            }
        };

        let oneof = match &f.oneof {
            None => None,
            Some(name) => {
                let idx = oneofs
                    .iter()
                    .position(|o| &o.name == name)
                    .ok_or_else(|| SchemaError::UnknownOneof {
                        message: m.name.clone(),
                        field: f.name.clone(),
                        oneof: name.clone(),
                    })?;
                if f.label != Label::Singular {
                    return Err(SchemaError::InvalidOneofMember {
                        message: m.name.clone(),
                        field: f.name.clone(),
                    });
                }
                Some(idx)
            }
        };

        let resolved = f.options.resolve(&f.name, policy, enum_options);
        Ok(FieldDescriptor {
            name: f.name.clone(),
            value,
            cardinality,
            json_name: resolved.key,
            omit_empty: resolved.omit_empty,
            enum_as_string: resolved.enum_as_string,
            oneof,
        })
    }

    fn type_ref<'f>(&self, m: &MessageDef, f: &'f FieldDef) -> Result<&'f str, SchemaError> {
        f.type_name
            .as_deref()
            .ok_or_else(|| SchemaError::MissingTypeRef {
                message: m.name.clone(),
                field: f.name.clone(),
                kind: f.kind.as_str(),
            })
    }
}

/// Collects JSON keys for one scope and rejects empty or repeated ones.
struct KeySpace<'a, R> {
    message: &'a str,
    scope: String,
    routes: HashMap<String, R>,
}

impl<'a, R> KeySpace<'a, R> {
    fn new(message: &'a str, scope: String) -> Self {
        Self {
            message,
            scope,
            routes: HashMap::new(),
        }
    }

    fn insert(&mut self, field: &FieldDescriptor, route: R) -> Result<(), SchemaError> {
        match &field.json_name {
            Some(key) => self.insert_key(&field.name, key.clone(), route),
            None => Ok(()),
        }
    }

    fn insert_key(&mut self, name: &str, key: String, route: R) -> Result<(), SchemaError> {
        if key.is_empty() {
            return Err(SchemaError::EmptyJsonKey {
                message: self.message.to_string(),
                name: name.to_string(),
            });
        }
        match self.routes.entry(key) {
            Entry::Occupied(e) => Err(SchemaError::DuplicateJsonKey {
                scope: self.scope.clone(),
                key: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(route);
                Ok(())
            }
        }
    }
}
