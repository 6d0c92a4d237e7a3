mod common;

use std::sync::Arc;

use common::{message_type, text};
use indexmap::IndexMap;
use protojson::{
    marshal, EncodeError, EnumDef, FieldDef, FieldValue, Kind, MapKey, Message, MessageDef,
    NameStyle, OneofDef, Schema, SchemaDef, SerializeOptions, Value,
};

fn compile(def: SchemaDef) -> Arc<Schema> {
    def.compile().unwrap()
}

fn new_message(schema: &Arc<Schema>, name: &str) -> Message {
    schema.message_type(name).unwrap().new_message()
}

#[test]
fn scenario_omit_empty_string() {
    let schema = compile(SchemaDef::new().message(
        MessageDef::new("Omit")
            .field(FieldDef::new("t_string1", Kind::String).omit_empty(true))
            .field(FieldDef::new("t_string2", Kind::String)),
    ));
    let mut m = new_message(&schema, "Omit");
    assert_eq!(text(&m), r#"{"t_string2":""}"#);
    m.set_value("t_string1", "x").unwrap();
    assert_eq!(text(&m), r#"{"t_string1":"x","t_string2":""}"#);
}

#[test]
fn scenario_bytes_empty_versus_nil() {
    let mut m = message_type("UnmarshalData").new_message();
    m.set_value("t_bytes", Vec::<u8>::new()).unwrap();
    assert!(text(&m).contains(r#""t_bytes":"""#));
    m.set_value("t_bytes", Value::Bytes(None)).unwrap();
    assert!(text(&m).contains(r#""t_bytes":null"#));
}

#[test]
fn scalar_output_matrix() {
    let schema = compile(
        SchemaDef::new()
            .enumeration(EnumDef::new("Color").value("RED", 0).value("BLUE", 2))
            .message(
                MessageDef::new("Sample")
                    .field(FieldDef::new("i32", Kind::Sint32))
                    .field(FieldDef::new("i64", Kind::Sfixed64))
                    .field(FieldDef::new("u32", Kind::Fixed32))
                    .field(FieldDef::new("u64", Kind::Uint64))
                    .field(FieldDef::new("f32", Kind::Float))
                    .field(FieldDef::new("f64", Kind::Double))
                    .field(FieldDef::new("flag", Kind::Bool))
                    .field(FieldDef::new("text", Kind::String))
                    .field(FieldDef::new("raw", Kind::Bytes))
                    .field(FieldDef::enumeration("num", "Color"))
                    .field(FieldDef::enumeration("sym", "Color").enum_string(true)),
            ),
    );
    let mut m = new_message(&schema, "Sample");
    assert_eq!(
        text(&m),
        r#"{"i32":0,"i64":0,"u32":0,"u64":0,"f32":0,"f64":0,"flag":false,"text":"","raw":null,"num":0,"sym":"RED"}"#
    );

    m.set_value("i32", i32::MIN).unwrap();
    m.set_value("i64", i64::MAX).unwrap();
    m.set_value("u32", u32::MAX).unwrap();
    m.set_value("u64", u64::MAX).unwrap();
    m.set_value("f32", 0.1f32).unwrap();
    m.set_value("f64", -2.5e-8).unwrap();
    m.set_value("flag", true).unwrap();
    m.set_value("text", "a<b>&\"c\"\n").unwrap();
    m.set_value("raw", b"hello".to_vec()).unwrap();
    m.set_value("num", Value::Enum(2)).unwrap();
    m.set_value("sym", Value::Enum(2)).unwrap();
    assert_eq!(
        text(&m),
        concat!(
            r#"{"i32":-2147483648,"i64":9223372036854775807,"u32":4294967295,"#,
            r#""u64":18446744073709551615,"f32":0.1,"f64":-0.000000025,"flag":true,"#,
            r#""text":"a\u003cb\u003e\u0026\"c\"\n","raw":"aGVsbG8=","num":2,"sym":"BLUE"}"#
        )
    );

    m.set_value("f32", f32::NAN).unwrap();
    m.set_value("f64", f64::NEG_INFINITY).unwrap();
    m.set_value("sym", Value::Enum(7)).unwrap();
    let out = text(&m);
    assert!(out.contains(r#""f32":"NaN","f64":"-Inf""#), "{out}");
    assert!(out.contains(r#""sym":"7""#), "{out}");
}

#[test]
fn containers_output() {
    let mut m = message_type("UnmarshalData").new_message();
    m.set(
        "array_enum2",
        FieldValue::Repeated(Some(vec![Value::Enum(1), Value::Enum(0)])),
    )
    .unwrap();
    m.set(
        "array_bytes",
        FieldValue::Repeated(Some(vec![
            Value::Bytes(None),
            Value::Bytes(Some(vec![])),
            Value::Bytes(Some(vec![1])),
        ])),
    )
    .unwrap();
    let mut entries = IndexMap::new();
    entries.insert(MapKey::Bool(true), Value::from("yes"));
    entries.insert(MapKey::Bool(false), Value::from("no"));
    m.set("map_bool_string", FieldValue::Map(Some(entries))).unwrap();
    let mut entries = IndexMap::new();
    entries.insert(MapKey::U64(u64::MAX), Value::I32(1));
    m.set("map_uint64_int32", FieldValue::Map(Some(entries))).unwrap();
    m.set("map_int32_enum2", FieldValue::Map(Some(IndexMap::new()))).unwrap();

    let out = text(&m);
    for part in [
        r#""array_enum2":["stopped","running"]"#,
        r#""array_bytes":[null,"","AQ=="]"#,
        r#""map_bool_string":{"true":"yes","false":"no"}"#,
        r#""map_uint64_int32":{"18446744073709551615":1}"#,
        r#""map_int32_enum2":{}"#,
        r#""array_int32":null"#,
        r#""map_int32_int32":null"#,
    ] {
        assert!(out.contains(part), "missing {part} in {out}");
    }
}

#[test]
fn default_output_is_valid_json_in_declaration_order() {
    let m = message_type("UnmarshalData").new_message();
    let out = m.marshal_json().unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let obj = doc.as_object().unwrap();
    assert_eq!(obj.len(), 66);
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    assert_eq!(keys[0], "t_string");
    assert_eq!(keys[14], "t_enum1");
    assert_eq!(keys[19], "array_string");
    assert_eq!(keys[65], "map_bool_string");
    assert_eq!(obj["t_enum2"], serde_json::json!("running"));
    assert_eq!(obj["t_config"], serde_json::Value::Null);
}

#[test]
fn name_styles() {
    let fields = |m: MessageDef| {
        m.field(FieldDef::new("name_style1", Kind::Int32))
            .field(FieldDef::new("names_Style2", Kind::Int32))
            .field(FieldDef::new("Name_Style3", Kind::Int32))
            .field(FieldDef::new("name_style4", Kind::Int32).json("custom"))
            .field(FieldDef::new("one_of1_a", Kind::Int32).in_oneof("one_of1"))
            .oneof(OneofDef::new("one_of1"))
    };
    let schema = compile(
        SchemaDef::new()
            .message(fields(MessageDef::new("Text")))
            .message(fields(MessageDef::new("Upper").name_style(NameStyle::UpperCamel)))
            .message(fields(MessageDef::new("Json").name_style(NameStyle::JsonName))),
    );
    let cases = [
        ("Text", r#"{"name_style1":0,"names_Style2":0,"Name_Style3":0,"custom":0,"one_of1":{"one_of1_a":0}}"#),
        ("Upper", r#"{"NameStyle1":0,"Names_Style2":0,"Name_Style3":0,"custom":0,"OneOf1":{"OneOf1A":0}}"#),
        ("Json", r#"{"nameStyle1":0,"namesStyle2":0,"NameStyle3":0,"custom":0,"one_of1":{"oneOf1A":0}}"#),
    ];
    for (name, expected) in cases {
        let mut m = new_message(&schema, name);
        m.set_oneof("one_of1_a", 0).unwrap();
        assert_eq!(text(&m), expected, "{name}");

        let mut back = new_message(&schema, name);
        back.unmarshal_json(expected.as_bytes()).unwrap();
        assert_eq!(back, m, "{name}");
    }
}

#[test]
fn ignored_fields_and_groups() {
    let schema = compile(
        SchemaDef::new().message(
            MessageDef::new("Ignore")
                .field(FieldDef::new("kept", Kind::Int32))
                .field(FieldDef::new("dash", Kind::Int32).json("-"))
                .field(FieldDef::new("skip", Kind::String).ignore())
                .field(FieldDef::new("gone", Kind::Int32).in_oneof("group"))
                .oneof(OneofDef::new("group").json("-")),
        ),
    );
    let mut m = new_message(&schema, "Ignore");
    m.set_value("dash", 5).unwrap();
    m.set_value("skip", "x").unwrap();
    m.set_oneof("gone", 3).unwrap();
    assert_eq!(text(&m), r#"{"kept":0}"#);

    let mut m = new_message(&schema, "Ignore");
    m.unmarshal_json(br#"{"kept": 1, "dash": 2, "skip": "s", "gone": 4, "group": {"gone": 4}}"#)
        .unwrap();
    assert_eq!(m.get("dash").unwrap(), &FieldValue::Singular(Value::I32(0)));
    assert_eq!(m.get("skip").unwrap(), &FieldValue::Singular(Value::String(String::new())));
    assert_eq!(m.which_oneof("group").unwrap(), None);
}

#[test]
fn ignored_oneof_member_drops_its_group() {
    let schema = compile(
        SchemaDef::new().message(
            MessageDef::new("Members")
                .field(FieldDef::new("a", Kind::Int32).in_oneof("v"))
                .field(FieldDef::new("b", Kind::Int32).in_oneof("v").ignore())
                .field(FieldDef::new("c", Kind::Int32).in_oneof("v").json("-"))
                .field(FieldDef::new("d", Kind::Int32).in_oneof("h").ignore())
                .oneof(OneofDef::new("v"))
                .oneof(OneofDef::new("h").hidden(true)),
        ),
    );
    let mut m = new_message(&schema, "Members");
    m.set_oneof("a", 1).unwrap();
    m.set_oneof("d", 2).unwrap();
    assert_eq!(text(&m), r#"{"v":{"a":1}}"#);
    m.set_oneof("b", 7).unwrap();
    assert_eq!(text(&m), "{}");
    m.set_oneof("c", 8).unwrap();
    assert_eq!(text(&m), "{}");
}

#[test]
fn schema_level_options_apply_to_every_message() {
    let schema = compile(
        SchemaDef::new()
            .options(SerializeOptions {
                omit_empty: Some(true),
                use_enum_string: Some(true),
                ..Default::default()
            })
            .enumeration(EnumDef::new("E").value("ZERO", 0))
            .message(
                MessageDef::new("A")
                    .field(FieldDef::new("n", Kind::Int64))
                    .field(FieldDef::enumeration("e", "E"))
                    .field(FieldDef::new("keep", Kind::Int64).omit_empty(false)),
            ),
    );
    let m = new_message(&schema, "A");
    assert_eq!(text(&m), r#"{"e":"ZERO","keep":0}"#);
}

#[test]
fn visible_oneof_without_member_is_null() {
    let m = message_type("OneofNotHide").new_message();
    assert_eq!(text(&m), r#"{"type":null,"after":""}"#);
}

#[test]
fn free_function_marshal() {
    let m = message_type("Config").new_message();
    assert_eq!(marshal(Some(&m)).unwrap(), br#"{"ip":"","port":0}"#);
    assert_eq!(marshal(None).unwrap(), b"null");
}

#[test]
fn mismatched_nested_message_is_reported() {
    let mut m = message_type("UnmarshalData").new_message();
    *m.get_mut("t_config").unwrap() =
        FieldValue::Singular(message_type("Aliases").new_message().into());
    assert_eq!(
        m.marshal_json().unwrap_err(),
        EncodeError::MessageMismatch {
            field: "t_config".into(),
            expected: "Config".into(),
            found: "Aliases".into(),
        }
    );

    let mut m = message_type("UnmarshalData").new_message();
    *m.get_mut("array_int32").unwrap() = FieldValue::Singular(Value::I32(1));
    assert!(matches!(
        m.marshal_json().unwrap_err(),
        EncodeError::ValueMismatch { found: "a singular value", .. }
    ));
}
