//! Runtime field policy: omit-empty elision, oneof placement and the
//! unknown-key rule. Everything here reads settings already resolved into
//! the descriptors.

use tracing::trace;

use crate::decoder::Decoder;
use crate::descriptor::{Cardinality, FieldDescriptor, MessageDescriptor, OneofDescriptor, ValueType};
use crate::error::DecodeError;
use crate::value::{FieldValue, Value};

/// Where a populated oneof member is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// At the parent object's level, under the member's own key.
    Inline,
    /// Inside an object under the group's discriminator key.
    Nested(&'a str),
}

impl OneofDescriptor {
    /// `None` when the group is ignored.
    pub fn placement(&self) -> Option<Placement<'_>> {
        let key = self.json_name.as_deref()?;
        Some(if self.hidden {
            Placement::Inline
        } else {
            Placement::Nested(key)
        })
    }
}

/// Whether a single value of `field` is elided from the output.
pub fn omit_value(field: &FieldDescriptor, value: &Value) -> bool {
    if !field.omit_empty {
        return false;
    }
    if field.enum_as_string && matches!(field.value, ValueType::Enum(_)) {
        return false;
    }
    value.is_empty()
}

/// Whether a whole field slot is elided from the output.
pub fn omit_field(field: &FieldDescriptor, slot: &FieldValue) -> bool {
    if !field.omit_empty {
        return false;
    }
    match slot {
        FieldValue::Singular(v) => omit_value(field, v),
        FieldValue::Optional(v) => v.is_none(),
        FieldValue::Repeated(v) => v.as_ref().map_or(true, Vec::is_empty),
        FieldValue::Map(v) => v.as_ref().map_or(true, |m| m.is_empty()),
    }
}

/// Whether `slot` has the shape the field's cardinality calls for.
pub(crate) fn shape_matches(cardinality: Cardinality, slot: &FieldValue) -> bool {
    matches!(
        (cardinality, slot),
        (Cardinality::Singular, FieldValue::Singular(_))
            | (Cardinality::Optional, FieldValue::Optional(_))
            | (Cardinality::Repeated, FieldValue::Repeated(_))
            | (Cardinality::Map { .. }, FieldValue::Map(_))
    )
}

/// Applies the unknown-field rule to a top-level key the message does not
/// route. The value is consumed when the key is allowed.
pub(crate) fn unknown_field(
    dec: &mut Decoder<'_>,
    message: &MessageDescriptor,
    key: &str,
) -> Result<(), DecodeError> {
    if message.disallow_unknown {
        return Err(DecodeError::UnknownField {
            key: key.to_string(),
        });
    }
    let skipped = dec.read_item()?;
    trace!(message = %message.name, key, bytes = skipped.len(), "skipping unknown json key");
    Ok(())
}

/// Same as [`unknown_field`] for a key inside a visible oneof object.
pub(crate) fn unknown_oneof_field(
    dec: &mut Decoder<'_>,
    message: &MessageDescriptor,
    key: &str,
) -> Result<(), DecodeError> {
    if message.disallow_unknown {
        return Err(DecodeError::UnknownOneofField {
            key: key.to_string(),
        });
    }
    let skipped = dec.read_item()?;
    trace!(message = %message.name, key, bytes = skipped.len(), "skipping unknown oneof key");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_def::{EnumDef, FieldDef, Kind, MessageDef, OneofDef, SchemaDef};

    fn descriptor() -> MessageDescriptor {
        SchemaDef::new()
            .enumeration(EnumDef::new("E").value("ZERO", 0))
            .message(
                MessageDef::new("M")
                    .field(FieldDef::new("s", Kind::String).omit_empty(true))
                    .field(FieldDef::enumeration("e", "E").omit_empty(true).enum_string(true))
                    .field(FieldDef::new("o", Kind::Int32).optional().omit_empty(true))
                    .field(FieldDef::new("l", Kind::Int32).repeated().omit_empty(true))
                    .field(FieldDef::new("keep", Kind::String))
                    .field(FieldDef::new("a", Kind::Bool).in_oneof("h"))
                    .field(FieldDef::new("b", Kind::Bool).in_oneof("v"))
                    .oneof(OneofDef::new("h").hidden(true))
                    .oneof(OneofDef::new("v").json("kind"))
                    .disallow_unknown_fields(),
            )
            .compile()
            .unwrap()
            .message_type("M")
            .unwrap()
            .descriptor()
            .clone()
    }

    #[test]
    fn omit_empty_per_slot() {
        let d = descriptor();
        let f = &d.fields;
        assert!(omit_field(&f[0], &FieldValue::Singular(Value::String(String::new()))));
        assert!(!omit_field(&f[0], &FieldValue::Singular(Value::String("x".into()))));
        // Enums rendered as strings are always written.
        assert!(!omit_field(&f[1], &FieldValue::Singular(Value::Enum(0))));
        assert!(omit_field(&f[2], &FieldValue::Optional(None)));
        assert!(!omit_field(&f[2], &FieldValue::Optional(Some(Value::I32(0)))));
        assert!(omit_field(&f[3], &FieldValue::Repeated(Some(vec![]))));
        assert!(!omit_field(&f[3], &FieldValue::Repeated(Some(vec![Value::I32(0)]))));
        assert!(!omit_field(&f[4], &FieldValue::Singular(Value::String(String::new()))));
    }

    #[test]
    fn oneof_placement() {
        let d = descriptor();
        assert_eq!(d.oneofs[0].placement(), Some(Placement::Inline));
        assert_eq!(d.oneofs[1].placement(), Some(Placement::Nested("kind")));
    }

    #[test]
    fn unknown_keys_follow_message_policy() {
        let d = descriptor();
        let mut dec = Decoder::new(b"1").unwrap();
        assert_eq!(
            unknown_field(&mut dec, &d, "zzz").unwrap_err().to_string(),
            r#"json: unknown field "zzz""#
        );
        assert_eq!(
            unknown_oneof_field(&mut dec, &d, "zzz").unwrap_err().to_string(),
            r#"json: unknown oneof field "zzz""#
        );
    }
}
