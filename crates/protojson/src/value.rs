//! Message instances.
//!
//! A [`Message`] is a mutable record shaped by its [`MessageType`]. Every
//! slot starts in its zero state: scalars at their zero value and optional,
//! bytes, message, repeated and map slots unset. Oneof groups hold at most
//! one populated member as a tagged [`OneofCase`].

use indexmap::IndexMap;

use crate::descriptor::{Cardinality, MessageDescriptor, MessageType, Schema, ValueType};
use crate::error::{DecodeError, EncodeError, FieldError};
use crate::schema_def::Kind;

/// Deepest chain of nested messages the codec decodes or encodes, counting
/// the outermost message.
pub const MAX_MESSAGE_DEPTH: usize = 100;

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// `None` is the nil state, distinct from an empty byte string.
    Bytes(Option<Vec<u8>>),
    /// Enum number.
    Enum(i32),
    Message(Option<Box<Message>>),
}

impl Value {
    /// Zero value for one element of type `ty`.
    pub fn zero(ty: ValueType) -> Value {
        match ty {
            ValueType::Scalar(kind) => match kind {
                Kind::Bool => Value::Bool(false),
                Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
                Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
                Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
                Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
                Kind::Float => Value::F32(0.0),
                Kind::Double => Value::F64(0.0),
                Kind::String => Value::String(String::new()),
                Kind::Bytes => Value::Bytes(None),
                Kind::Enum => Value::Enum(0),
                Kind::Message => Value::Message(None),
            },
            ValueType::Enum(_) => Value::Enum(0),
            ValueType::Message(_) => Value::Message(None),
        }
    }

    /// Whether this value may be stored where `ty` is expected.
    pub fn fits(&self, ty: ValueType) -> bool {
        match (self, ty) {
            (Value::Enum(_), ValueType::Enum(_)) => true,
            (Value::Message(None), ValueType::Message(_)) => true,
            (Value::Message(Some(m)), ValueType::Message(id)) => m.message_type().id() == id,
            (v, ValueType::Scalar(kind)) => {
                std::mem::discriminant(v) == std::mem::discriminant(&Value::zero(ty))
                    && !matches!(kind, Kind::Enum | Kind::Message)
            }
            _ => false,
        }
    }

    /// Whether omit-empty elides this value.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Bool(v) => !v,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.as_ref().map_or(true, Vec::is_empty),
            Value::Enum(v) => *v == 0,
            Value::Message(v) => v.is_none(),
        }
    }

    pub(crate) fn variant_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Vec<u8>",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Some(v))
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(Some(Box::new(v)))
    }
}

/// Map keys. JSON object keys are always strings; integer and bool keys are
/// rendered in decimal / as `true`/`false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl MapKey {
    pub fn fits(&self, kind: Kind) -> bool {
        matches!(
            (self, kind),
            (MapKey::Bool(_), Kind::Bool)
                | (MapKey::I32(_), Kind::Int32 | Kind::Sint32 | Kind::Sfixed32)
                | (MapKey::I64(_), Kind::Int64 | Kind::Sint64 | Kind::Sfixed64)
                | (MapKey::U32(_), Kind::Uint32 | Kind::Fixed32)
                | (MapKey::U64(_), Kind::Uint64 | Kind::Fixed64)
                | (MapKey::String(_), Kind::String)
        )
    }

    pub fn to_key_string(&self) -> String {
        match self {
            MapKey::Bool(v) => v.to_string(),
            MapKey::I32(v) => v.to_string(),
            MapKey::I64(v) => v.to_string(),
            MapKey::U32(v) => v.to_string(),
            MapKey::U64(v) => v.to_string(),
            MapKey::String(v) => v.clone(),
        }
    }
}

impl From<&str> for MapKey {
    fn from(v: &str) -> Self {
        MapKey::String(v.to_string())
    }
}

impl From<i32> for MapKey {
    fn from(v: i32) -> Self {
        MapKey::I32(v)
    }
}

impl From<i64> for MapKey {
    fn from(v: i64) -> Self {
        MapKey::I64(v)
    }
}

impl From<u32> for MapKey {
    fn from(v: u32) -> Self {
        MapKey::U32(v)
    }
}

impl From<u64> for MapKey {
    fn from(v: u64) -> Self {
        MapKey::U64(v)
    }
}

impl From<bool> for MapKey {
    fn from(v: bool) -> Self {
        MapKey::Bool(v)
    }
}

/// The contents of one field slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Singular(Value),
    Optional(Option<Value>),
    /// `None` is nil, `Some(vec![])` is empty.
    Repeated(Option<Vec<Value>>),
    /// `None` is nil, `Some(map)` with no entries is empty.
    Map(Option<IndexMap<MapKey, Value>>),
}

impl FieldValue {
    pub fn zero(ty: ValueType, cardinality: Cardinality) -> FieldValue {
        match cardinality {
            Cardinality::Singular => FieldValue::Singular(Value::zero(ty)),
            Cardinality::Optional => FieldValue::Optional(None),
            Cardinality::Repeated => FieldValue::Repeated(None),
            Cardinality::Map { .. } => FieldValue::Map(None),
        }
    }

    fn fits(&self, ty: ValueType, cardinality: Cardinality) -> bool {
        match (self, cardinality) {
            (FieldValue::Singular(v), Cardinality::Singular) => v.fits(ty),
            (FieldValue::Optional(v), Cardinality::Optional) => {
                v.as_ref().map_or(true, |v| v.fits(ty))
            }
            (FieldValue::Repeated(v), Cardinality::Repeated) => {
                v.iter().flatten().all(|v| v.fits(ty))
            }
            (FieldValue::Map(v), Cardinality::Map { key }) => v
                .iter()
                .flatten()
                .all(|(k, v)| k.fits(key) && v.fits(ty)),
            _ => false,
        }
    }
}

/// The populated member of a oneof group.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofCase {
    /// Member field index.
    pub field: usize,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    ty: MessageType,
    /// One slot per declared field; oneof members keep theirs at zero.
    pub(crate) values: Vec<FieldValue>,
    pub(crate) oneofs: Vec<Option<OneofCase>>,
}

impl Message {
    pub fn new(ty: &MessageType) -> Message {
        let d = ty.descriptor();
        Message {
            ty: ty.clone(),
            values: d
                .fields
                .iter()
                .map(|f| FieldValue::zero(f.value, f.cardinality))
                .collect(),
            oneofs: vec![None; d.oneofs.len()],
        }
    }

    pub fn message_type(&self) -> &MessageType {
        &self.ty
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        self.ty.descriptor()
    }

    pub(crate) fn schema(&self) -> &Schema {
        self.ty.schema()
    }

    fn non_member(&self, name: &str) -> Result<usize, FieldError> {
        let d = self.descriptor();
        let idx = d.field_index(name).ok_or_else(|| FieldError::UnknownField {
            message: d.name.clone(),
            field: name.to_string(),
        })?;
        if let Some(o) = d.fields[idx].oneof {
            return Err(FieldError::OneofMember {
                oneof: d.oneofs[o].name.clone(),
                field: name.to_string(),
            });
        }
        Ok(idx)
    }

    pub fn get(&self, field: &str) -> Result<&FieldValue, FieldError> {
        let idx = self.non_member(field)?;
        Ok(&self.values[idx])
    }

    /// Unchecked mutable access; the value must keep its field's shape.
    pub fn get_mut(&mut self, field: &str) -> Result<&mut FieldValue, FieldError> {
        let idx = self.non_member(field)?;
        Ok(&mut self.values[idx])
    }

    pub fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FieldError> {
        let idx = self.non_member(field)?;
        let f = &self.descriptor().fields[idx];
        if !value.fits(f.value, f.cardinality) {
            return Err(FieldError::TypeMismatch {
                field: field.to_string(),
                expected: self.schema().field_type_name(f),
            });
        }
        self.values[idx] = value;
        Ok(())
    }

    /// Shorthand for `set(field, FieldValue::Singular(value))`.
    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        self.set(field, FieldValue::Singular(value.into()))
    }

    /// Populates `field` as the active member of its oneof group, replacing
    /// whichever member was set before.
    pub fn set_oneof(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        let d = self.descriptor();
        let idx = d.field_index(field).ok_or_else(|| FieldError::UnknownField {
            message: d.name.clone(),
            field: field.to_string(),
        })?;
        let f = &d.fields[idx];
        let Some(o) = f.oneof else {
            return Err(FieldError::NotOneofMember {
                field: field.to_string(),
            });
        };
        if !value.fits(f.value) {
            return Err(FieldError::TypeMismatch {
                field: field.to_string(),
                expected: self.schema().field_type_name(f),
            });
        }
        self.oneofs[o] = Some(OneofCase { field: idx, value });
        Ok(())
    }

    /// The populated member of `oneof`, by field name.
    pub fn which_oneof(&self, oneof: &str) -> Result<Option<(&str, &Value)>, FieldError> {
        let d = self.descriptor();
        let o = d.oneof_index(oneof).ok_or_else(|| FieldError::UnknownOneof {
            message: d.name.clone(),
            oneof: oneof.to_string(),
        })?;
        Ok(self.oneofs[o]
            .as_ref()
            .map(|case| (d.fields[case.field].name.as_str(), &case.value)))
    }

    pub fn clear_oneof(&mut self, oneof: &str) -> Result<(), FieldError> {
        let d = self.descriptor();
        let o = d.oneof_index(oneof).ok_or_else(|| FieldError::UnknownOneof {
            message: d.name.clone(),
            oneof: oneof.to_string(),
        })?;
        self.oneofs[o] = None;
        Ok(())
    }

    pub fn marshal_json(&self) -> Result<Vec<u8>, EncodeError> {
        crate::marshal::marshal_message(self)
    }

    /// Merges `data` into this instance.
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        crate::unmarshal::unmarshal_message(self, data)
    }
}

impl Drop for Message {
    /// Detaches nested messages onto a heap stack so a long chain is freed
    /// without recursing once per level.
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut child) = pending.pop() {
            detach_children(&mut child, &mut pending);
        }
    }
}

fn detach_children(m: &mut Message, out: &mut Vec<Box<Message>>) {
    let mut take = |v: &mut Value| {
        if let Value::Message(child) = v {
            out.extend(child.take());
        }
    };
    for slot in &mut m.values {
        match slot {
            FieldValue::Singular(v) => take(v),
            FieldValue::Optional(v) => v.iter_mut().for_each(&mut take),
            FieldValue::Repeated(list) => list.iter_mut().flatten().for_each(&mut take),
            FieldValue::Map(map) => map.iter_mut().flat_map(|m| m.values_mut()).for_each(&mut take),
        }
    }
    for case in m.oneofs.iter_mut().flatten() {
        take(&mut case.value);
    }
}
