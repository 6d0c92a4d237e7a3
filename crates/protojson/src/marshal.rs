//! Message → JSON.
//!
//! Slots are written in declaration order straight into an [`Encoder`]; there
//! is no intermediate document tree.

use crate::descriptor::{Cardinality, FieldDescriptor, Schema, Slot, ValueType};
use crate::encoder::Encoder;
use crate::error::EncodeError;
use crate::policy::{omit_field, omit_value, shape_matches, Placement};
use crate::value::{FieldValue, Message, Value, MAX_MESSAGE_DEPTH};

/// Encodes `message`, or `null` when there is none.
pub fn marshal(message: Option<&Message>) -> Result<Vec<u8>, EncodeError> {
    match message {
        None => Ok(b"null".to_vec()),
        Some(m) => marshal_message(m),
    }
}

pub(crate) fn marshal_message(m: &Message) -> Result<Vec<u8>, EncodeError> {
    let mut enc = Encoder::new(m.descriptor().buf_hint);
    write_message(&mut enc, m, 1)?;
    Ok(enc.into_bytes())
}

fn write_message(enc: &mut Encoder, m: &Message, depth: usize) -> Result<(), EncodeError> {
    let d = m.descriptor();
    if depth > MAX_MESSAGE_DEPTH {
        return Err(EncodeError::MaxDepth {
            message: d.name.clone(),
        });
    }
    let w = Writer {
        schema: m.schema(),
        message: &d.name,
        depth,
    };
    enc.begin_object();
    for slot in &d.layout {
        match *slot {
            Slot::Field(i) => {
                let f = &d.fields[i];
                let Some(key) = f.json_name.as_deref() else {
                    continue;
                };
                let value = &m.values[i];
                if omit_field(f, value) {
                    continue;
                }
                enc.write_key(key);
                w.field(enc, f, value)?;
            }
            Slot::Oneof(o) => {
                let group = &d.oneofs[o];
                let Some(placement) = group.placement() else {
                    continue;
                };
                let Some(case) = &m.oneofs[o] else {
                    if let Placement::Nested(key) = placement {
                        if !group.omit_empty {
                            enc.write_key(key);
                            enc.write_null();
                        }
                    }
                    continue;
                };
                let f = &d.fields[case.field];
                let Some(member) = f.json_name.as_deref() else {
                    continue;
                };
                if omit_value(f, &case.value) {
                    continue;
                }
                match placement {
                    Placement::Inline => {
                        enc.write_key(member);
                        w.value(enc, f, &case.value)?;
                    }
                    Placement::Nested(key) => {
                        enc.write_key(key);
                        enc.begin_object();
                        enc.write_key(member);
                        w.value(enc, f, &case.value)?;
                        enc.end_object();
                    }
                }
            }
        }
    }
    enc.end_object();
    Ok(())
}

struct Writer<'a> {
    schema: &'a Schema,
    message: &'a str,
    depth: usize,
}

impl Writer<'_> {
    fn field(&self, enc: &mut Encoder, f: &FieldDescriptor, slot: &FieldValue) -> Result<(), EncodeError> {
        if !shape_matches(f.cardinality, slot) {
            return Err(self.mismatch(f, slot_name(slot)));
        }
        match slot {
            FieldValue::Singular(v) => self.value(enc, f, v),
            FieldValue::Optional(None) | FieldValue::Repeated(None) | FieldValue::Map(None) => {
                enc.write_null();
                Ok(())
            }
            FieldValue::Optional(Some(v)) => self.value(enc, f, v),
            FieldValue::Repeated(Some(items)) => {
                enc.begin_array();
                for v in items {
                    self.value(enc, f, v)?;
                }
                enc.end_array();
                Ok(())
            }
            FieldValue::Map(Some(entries)) => {
                let Cardinality::Map { key: key_kind } = f.cardinality else {
                    return Err(self.mismatch(f, "map"));
                };
                enc.begin_object();
                for (k, v) in entries {
                    if !k.fits(key_kind) {
                        return Err(self.mismatch(f, "map key"));
                    }
                    enc.write_key(&k.to_key_string());
                    self.value(enc, f, v)?;
                }
                enc.end_object();
                Ok(())
            }
        }
    }

    fn value(&self, enc: &mut Encoder, f: &FieldDescriptor, v: &Value) -> Result<(), EncodeError> {
        match (f.value, v) {
            (ValueType::Enum(id), Value::Enum(n)) => {
                if !f.enum_as_string {
                    enc.write_i32(*n);
                    return Ok(());
                }
                match self.schema.enumeration(id).symbol(*n) {
                    Some(symbol) => enc.write_str(symbol),
                    None => enc.write_str(&n.to_string()),
                }
                Ok(())
            }
            (ValueType::Message(_), Value::Message(None)) => {
                enc.write_null();
                Ok(())
            }
            (ValueType::Message(id), Value::Message(Some(child))) => {
                if child.message_type().id() != id {
                    return Err(EncodeError::MessageMismatch {
                        field: f.name.clone(),
                        expected: self.schema.message(id).name.clone(),
                        found: child.message_type().name().to_string(),
                    });
                }
                write_message(enc, child, self.depth + 1)
            }
            (ValueType::Scalar(_), v) if v.fits(f.value) => {
                match v {
                    Value::Bool(b) => enc.write_bool(*b),
                    Value::I32(n) => enc.write_i32(*n),
                    Value::I64(n) => enc.write_i64(*n),
                    Value::U32(n) => enc.write_u32(*n),
                    Value::U64(n) => enc.write_u64(*n),
                    Value::F32(n) => enc.write_f32(*n),
                    Value::F64(n) => enc.write_f64(*n),
                    Value::String(s) => enc.write_str(s),
                    Value::Bytes(b) => enc.write_bytes(b.as_deref()),
                    Value::Enum(_) | Value::Message(_) => {
                        return Err(self.mismatch(f, v.variant_name()))
                    }
                }
                Ok(())
            }
            (_, v) => Err(self.mismatch(f, v.variant_name())),
        }
    }

    fn mismatch(&self, f: &FieldDescriptor, found: &'static str) -> EncodeError {
        EncodeError::ValueMismatch {
            message: self.message.to_string(),
            field: f.name.clone(),
            expected: self.schema.field_type_name(f),
            found,
        }
    }
}

fn slot_name(slot: &FieldValue) -> &'static str {
    match slot {
        FieldValue::Singular(_) => "a singular value",
        FieldValue::Optional(_) => "an optional value",
        FieldValue::Repeated(_) => "a list",
        FieldValue::Map(_) => "a map",
    }
}
