#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use protojson::{
    EnumDef, FieldDef, Kind, Message, MessageDef, MessageType, OneofDef, Schema, SchemaDef,
};

const SCALARS: [(&str, Kind); 14] = [
    ("string", Kind::String),
    ("int32", Kind::Int32),
    ("int64", Kind::Int64),
    ("uint32", Kind::Uint32),
    ("uint64", Kind::Uint64),
    ("sint32", Kind::Sint32),
    ("sint64", Kind::Sint64),
    ("sfixed32", Kind::Sfixed32),
    ("sfixed64", Kind::Sfixed64),
    ("fixed32", Kind::Fixed32),
    ("fixed64", Kind::Fixed64),
    ("float", Kind::Float),
    ("double", Kind::Double),
    ("bool", Kind::Bool),
];

const MAP_KEYS: [(&str, Kind); 10] = [
    ("int32", Kind::Int32),
    ("int64", Kind::Int64),
    ("uint32", Kind::Uint32),
    ("uint64", Kind::Uint64),
    ("sint32", Kind::Sint32),
    ("sint64", Kind::Sint64),
    ("sfixed32", Kind::Sfixed32),
    ("sfixed64", Kind::Sfixed64),
    ("fixed32", Kind::Fixed32),
    ("fixed64", Kind::Fixed64),
];

fn status() -> EnumDef {
    EnumDef::new("Status").value("running", 0).value("stopped", 1)
}

fn config() -> MessageDef {
    MessageDef::new("Config")
        .field(FieldDef::new("ip", Kind::String))
        .field(FieldDef::new("port", Kind::Int32))
}

/// Every field kind in every container, with `t_enum1` numeric and
/// `t_enum2` rendered as a string.
fn unmarshal_data() -> MessageDef {
    let mut m = MessageDef::new("UnmarshalData");
    for (name, kind) in SCALARS {
        m = m.field(FieldDef::new(format!("t_{name}"), kind));
    }
    m = m
        .field(FieldDef::enumeration("t_enum1", "Status"))
        .field(FieldDef::enumeration("t_enum2", "Status").enum_string(true))
        .field(FieldDef::new("t_bytes", Kind::Bytes))
        .field(FieldDef::message("t_aliases", "Aliases"))
        .field(FieldDef::message("t_config", "Config"));
    for (name, kind) in SCALARS {
        m = m.field(FieldDef::new(format!("array_{name}"), kind).repeated());
    }
    m = m
        .field(FieldDef::enumeration("array_enum1", "Status").repeated())
        .field(FieldDef::enumeration("array_enum2", "Status").repeated().enum_string(true))
        .field(FieldDef::new("array_bytes", Kind::Bytes).repeated())
        .field(FieldDef::message("array_config", "Config").repeated());
    for (name, kind) in SCALARS {
        m = m.field(FieldDef::new(format!("map_int32_{name}"), kind).map(Kind::Int32));
    }
    m = m
        .field(FieldDef::enumeration("map_int32_enum1", "Status").map(Kind::Int32))
        .field(
            FieldDef::enumeration("map_int32_enum2", "Status")
                .map(Kind::Int32)
                .enum_string(true),
        )
        .field(FieldDef::new("map_int32_bytes", Kind::Bytes).map(Kind::Int32))
        .field(FieldDef::message("map_int32_config", "Config").map(Kind::Int32));
    for (name, kind) in MAP_KEYS.iter().skip(1) {
        m = m.field(FieldDef::new(format!("map_{name}_int32"), Kind::Int32).map(*kind));
    }
    m.field(FieldDef::new("map_string_int32", Kind::Int32).map(Kind::String))
        .field(FieldDef::new("map_bool_string", Kind::String).map(Kind::Bool))
}

fn oneof_members(m: MessageDef, oneof: &str) -> MessageDef {
    m.field(FieldDef::new("t_string", Kind::String).in_oneof(oneof))
        .field(FieldDef::new("t_int32", Kind::Int32).in_oneof(oneof))
        .field(FieldDef::new("t_double", Kind::Double).in_oneof(oneof))
        .field(FieldDef::new("t_bool", Kind::Bool).in_oneof(oneof))
        .field(FieldDef::enumeration("t_enum1", "Status").in_oneof(oneof))
        .field(FieldDef::new("t_bytes", Kind::Bytes).in_oneof(oneof))
        .field(FieldDef::message("t_config", "Config").in_oneof(oneof))
}

/// Compiled once so instances built in different helpers share one schema
/// and compare equal.
pub fn schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(compile))
}

fn compile() -> Arc<Schema> {
    SchemaDef::new()
        .enumeration(status())
        .message(config())
        .message(MessageDef::new("Aliases").field(FieldDef::new("name", Kind::String)))
        .message(unmarshal_data())
        .message(
            oneof_members(MessageDef::new("OneofNotHide"), "type")
                .field(FieldDef::new("after", Kind::String))
                .oneof(OneofDef::new("type")),
        )
        .message(
            oneof_members(MessageDef::new("OneofHide"), "type")
                .field(FieldDef::new("after", Kind::String))
                .oneof(OneofDef::new("type").hidden(true)),
        )
        .compile()
        .unwrap()
}

pub fn message_type(name: &str) -> MessageType {
    schema().message_type(name).unwrap()
}

pub fn text(m: &Message) -> String {
    String::from_utf8(m.marshal_json().unwrap()).unwrap()
}

pub fn decode_err(m: &mut Message, json: &str) -> String {
    m.unmarshal_json(json.as_bytes()).unwrap_err().to_string()
}
