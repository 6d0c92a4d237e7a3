//! JSON → Message, merging into an existing instance.
//!
//! Per container kind:
//!
//! - scalars and strings overwrite; `null` resets a string to `""` and bytes
//!   or a nested message to nil; base64 text may carry CR/LF line breaks;
//! - a nested message that is already present is decoded in place;
//! - arrays replace the whole slot and every element starts fresh;
//! - maps merge key by key, decoding a present message entry in place;
//! - a oneof member always gets a fresh value, and only one member may
//!   appear per decode.

use std::sync::Arc;

use base64::Engine;
use indexmap::IndexMap;
use tracing::debug;

use crate::decoder::Decoder;
use crate::descriptor::{Cardinality, FieldDescriptor, MessageType, Route, Schema, ValueType};
use crate::error::{DecodeError, Position};
use crate::parse::{
    parse_bool, parse_f32, parse_f64, parse_i32, parse_i64, parse_u32, parse_u64, unquote,
};
use crate::policy::{shape_matches, unknown_field, unknown_oneof_field};
use crate::schema_def::Kind;
use crate::value::{FieldValue, MapKey, Message, OneofCase, Value, MAX_MESSAGE_DEPTH};

/// Decodes `data` into `message`.
///
/// With no message, `null` input succeeds and anything else fails with
/// [`DecodeError::NilReceiver`].
pub fn unmarshal(
    data: &[u8],
    ty: &MessageType,
    message: Option<&mut Message>,
) -> Result<(), DecodeError> {
    match message {
        Some(m) => unmarshal_message(m, data),
        None => {
            let mut dec = Decoder::new(data)?;
            if dec.peek()? == b'n' {
                return Ok(());
            }
            Err(DecodeError::NilReceiver {
                message: ty.name().to_string(),
            })
        }
    }
}

pub(crate) fn unmarshal_message(m: &mut Message, data: &[u8]) -> Result<(), DecodeError> {
    let result = decode_document(m, data);
    if let Err(err) = &result {
        debug!(message = %m.descriptor().name, error = %err, "json decode failed");
    }
    result
}

fn decode_document(m: &mut Message, data: &[u8]) -> Result<(), DecodeError> {
    let mut dec = Decoder::new(data)?;
    match dec.peek()? {
        b'{' => decode_object(&mut dec, m, 1)?,
        _ => {
            let raw = dec.read_item()?;
            if raw != b"null" {
                return Err(DecodeError::not_object(raw));
            }
        }
    }
    dec.finish()
}

fn decode_object(dec: &mut Decoder<'_>, m: &mut Message, depth: usize) -> Result<(), DecodeError> {
    if depth > MAX_MESSAGE_DEPTH {
        return Err(DecodeError::MaxDepth {
            message: m.descriptor().name.clone(),
        });
    }
    let ty = m.message_type().clone();
    let schema = ty.schema();
    let d = ty.descriptor();
    let mut stored = vec![false; d.oneofs.len()];

    dec.begin_object()?;
    while let Some(key) = dec.next_key()? {
        match d.routes.get(key.as_str()) {
            Some(&Route::Field(i)) => {
                let target = Target {
                    schema,
                    field: &d.fields[i],
                    key: &key,
                    depth,
                };
                match d.fields[i].oneof {
                    None => target.field(dec, &mut m.values[i])?,
                    Some(o) => target.member(dec, i, &mut stored[o], &mut m.oneofs[o])?,
                }
            }
            Some(&Route::Oneof(o)) => {
                let group = &d.oneofs[o];
                if dec.peek()? != b'{' {
                    let raw = dec.read_item()?;
                    if raw == b"null" {
                        continue;
                    }
                    return Err(DecodeError::mismatch(
                        raw,
                        Position::Oneof,
                        &key,
                        group.type_name.clone(),
                    ));
                }
                dec.begin_object()?;
                while let Some(inner) = dec.next_key()? {
                    match group.routes.get(inner.as_str()) {
                        Some(&i) => {
                            let target = Target {
                                schema,
                                field: &d.fields[i],
                                key: &key,
                                depth,
                            };
                            target.member(dec, i, &mut stored[o], &mut m.oneofs[o])?;
                        }
                        None => unknown_oneof_field(dec, d, &inner)?,
                    }
                }
            }
            None => unknown_field(dec, d, &key)?,
        }
    }
    Ok(())
}

/// The field a JSON value is decoded for, and the key it was found under.
struct Target<'a> {
    schema: &'a Arc<Schema>,
    field: &'a FieldDescriptor,
    key: &'a str,
    /// Nesting level of the message that owns `field`.
    depth: usize,
}

impl Target<'_> {
    fn mismatch(&self, raw: &[u8], position: Position) -> DecodeError {
        DecodeError::mismatch(
            raw,
            position,
            self.key,
            self.schema.field_type_name(self.field),
        )
    }

    fn field(&self, dec: &mut Decoder<'_>, slot: &mut FieldValue) -> Result<(), DecodeError> {
        if !shape_matches(self.field.cardinality, slot) {
            *slot = FieldValue::zero(self.field.value, self.field.cardinality);
        }
        match slot {
            FieldValue::Singular(v) => self.value(dec, Position::Value, v),
            FieldValue::Optional(v) => {
                if dec.peek()? == b'n' {
                    dec.read_item()?;
                    *v = None;
                    return Ok(());
                }
                let mut fresh = Value::zero(self.field.value);
                self.value(dec, Position::Value, &mut fresh)?;
                *v = Some(fresh);
                Ok(())
            }
            FieldValue::Repeated(list) => self.list(dec, list),
            FieldValue::Map(map) => match self.field.cardinality {
                Cardinality::Map { key } => self.map(dec, key, map),
                _ => Err(DecodeError::OutOfSync),
            },
        }
    }

    fn list(&self, dec: &mut Decoder<'_>, list: &mut Option<Vec<Value>>) -> Result<(), DecodeError> {
        if dec.peek()? != b'[' {
            let raw = dec.read_item()?;
            if raw == b"null" {
                *list = None;
                return Ok(());
            }
            return Err(self.mismatch(raw, Position::Array));
        }
        dec.begin_array()?;
        let mut items = Vec::new();
        while dec.next_element()? {
            let mut v = Value::zero(self.field.value);
            self.value(dec, Position::ArrayElement, &mut v)?;
            items.push(v);
        }
        *list = Some(items);
        Ok(())
    }

    fn map(
        &self,
        dec: &mut Decoder<'_>,
        key_kind: Kind,
        map: &mut Option<IndexMap<MapKey, Value>>,
    ) -> Result<(), DecodeError> {
        if dec.peek()? != b'{' {
            let raw = dec.read_item()?;
            if raw == b"null" {
                *map = None;
                return Ok(());
            }
            return Err(self.mismatch(raw, Position::Map));
        }
        dec.begin_object()?;
        let map = map.get_or_insert_with(IndexMap::new);
        while let Some(key) = dec.next_key()? {
            let k = parse_map_key(&key, key_kind)
                .ok_or_else(|| self.mismatch(key.as_bytes(), Position::MapKey))?;
            match map.get_mut(&k) {
                Some(existing) => self.value(dec, Position::MapValue, existing)?,
                None => {
                    let mut v = Value::zero(self.field.value);
                    self.value(dec, Position::MapValue, &mut v)?;
                    map.insert(k, v);
                }
            }
        }
        Ok(())
    }

    /// Decodes a oneof member into a fresh value and makes it the group's
    /// populated case.
    fn member(
        &self,
        dec: &mut Decoder<'_>,
        index: usize,
        stored: &mut bool,
        case: &mut Option<OneofCase>,
    ) -> Result<(), DecodeError> {
        let mut value = Value::zero(self.field.value);
        self.value(dec, Position::Value, &mut value)?;
        if std::mem::replace(stored, true) {
            return Err(DecodeError::OneofConflict {
                key: self.key.to_string(),
            });
        }
        *case = Some(OneofCase {
            field: index,
            value,
        });
        Ok(())
    }

    /// Decodes one item into `slot`. A nested message already in `slot` is
    /// merged into; every other kind is overwritten only once the item has
    /// parsed.
    fn value(
        &self,
        dec: &mut Decoder<'_>,
        position: Position,
        slot: &mut Value,
    ) -> Result<(), DecodeError> {
        match self.field.value {
            ValueType::Message(id) => {
                if dec.peek()? != b'{' {
                    let raw = dec.read_item()?;
                    if raw != b"null" {
                        return Err(DecodeError::not_object(raw));
                    }
                    *slot = Value::Message(None);
                    return Ok(());
                }
                if let Value::Message(Some(existing)) = slot {
                    return decode_object(dec, existing, self.depth + 1);
                }
                let mut child = Message::new(&MessageType::from_parts(self.schema, id));
                decode_object(dec, &mut child, self.depth + 1)?;
                *slot = Value::Message(Some(Box::new(child)));
                Ok(())
            }
            ValueType::Enum(id) => {
                let raw = dec.read_item()?;
                let e = self.schema.enumeration(id);
                let number = if self.field.enum_as_string && raw.first() == Some(&b'"') {
                    let symbol = unquote(raw).ok_or_else(|| self.mismatch(raw, position))?;
                    e.number(&symbol)
                } else {
                    let n = parse_i32(raw).ok_or_else(|| self.mismatch(raw, position))?;
                    e.symbol(n).map(|_| n)
                };
                let n = number.ok_or_else(|| DecodeError::UnknownEnumValue {
                    raw: String::from_utf8_lossy(raw).into_owned(),
                    field: self.key.to_string(),
                })?;
                *slot = Value::Enum(n);
                Ok(())
            }
            ValueType::Scalar(kind) => {
                let raw = dec.read_item()?;
                *slot = parse_scalar(raw, kind).ok_or_else(|| self.mismatch(raw, position))?;
                Ok(())
            }
        }
    }
}

fn parse_scalar(raw: &[u8], kind: Kind) -> Option<Value> {
    Some(match kind {
        Kind::Bool => Value::Bool(parse_bool(raw)?),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(parse_i32(raw)?),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(parse_i64(raw)?),
        Kind::Uint32 | Kind::Fixed32 => Value::U32(parse_u32(raw)?),
        Kind::Uint64 | Kind::Fixed64 => Value::U64(parse_u64(raw)?),
        Kind::Float => Value::F32(parse_f32(raw)?),
        Kind::Double => Value::F64(parse_f64(raw)?),
        Kind::String if raw == b"null" => Value::String(String::new()),
        Kind::String => Value::String(unquote(raw)?),
        Kind::Bytes if raw == b"null" => Value::Bytes(None),
        Kind::Bytes => {
            let mut text = unquote(raw)?;
            text.retain(|c| c != '\r' && c != '\n');
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(text)
                .ok()?;
            Value::Bytes(Some(bytes))
        }
        Kind::Enum | Kind::Message => return None,
    })
}

fn parse_map_key(key: &str, kind: Kind) -> Option<MapKey> {
    Some(match kind {
        Kind::String => MapKey::String(key.to_string()),
        Kind::Bool => MapKey::Bool(key.parse().ok()?),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => MapKey::I32(key.parse().ok()?),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => MapKey::I64(key.parse().ok()?),
        Kind::Uint32 | Kind::Fixed32 => MapKey::U32(key.parse().ok()?),
        Kind::Uint64 | Kind::Fixed64 => MapKey::U64(key.parse().ok()?),
        Kind::Bytes | Kind::Float | Kind::Double | Kind::Enum | Kind::Message => return None,
    })
}
