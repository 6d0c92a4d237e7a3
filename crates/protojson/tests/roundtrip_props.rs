mod common;

use std::collections::BTreeMap;

use common::message_type;
use indexmap::IndexMap;
use proptest::prelude::*;
use protojson::{FieldValue, MapKey, Value};

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, failure_persistence: None, .. ProptestConfig::default() })]

    #[test]
    fn prop_scalars_survive_marshal_then_unmarshal(
        i in any::<i32>(),
        l in any::<i64>(),
        u in any::<u32>(),
        ul in any::<u64>(),
        f in proptest::num::f32::NORMAL | proptest::num::f32::ZERO,
        d in proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL | proptest::num::f64::ZERO,
        b in any::<bool>(),
        s in any::<String>(),
        raw in proptest::option::of(proptest::collection::vec(any::<u8>(), 0..48)),
        e in 0i32..2,
    ) {
        let ty = message_type("UnmarshalData");
        let mut m = ty.new_message();
        m.set_value("t_sint32", i).unwrap();
        m.set_value("t_sfixed64", l).unwrap();
        m.set_value("t_fixed32", u).unwrap();
        m.set_value("t_uint64", ul).unwrap();
        m.set_value("t_float", f).unwrap();
        m.set_value("t_double", d).unwrap();
        m.set_value("t_bool", b).unwrap();
        m.set_value("t_string", s).unwrap();
        m.set_value("t_bytes", Value::Bytes(raw)).unwrap();
        m.set_value("t_enum1", Value::Enum(e)).unwrap();
        m.set_value("t_enum2", Value::Enum(1 - e)).unwrap();

        let out = m.marshal_json().unwrap();
        prop_assert!(serde_json::from_slice::<serde_json::Value>(&out).is_ok());
        let mut back = ty.new_message();
        back.unmarshal_json(&out).unwrap();
        prop_assert_eq!(back, m);
    }

    #[test]
    fn prop_array_decode_replaces(
        first in proptest::collection::vec(any::<i64>(), 0..16),
        second in proptest::collection::vec(any::<i64>(), 0..16),
    ) {
        let mut m = message_type("UnmarshalData").new_message();
        for values in [&first, &second] {
            let input = serde_json::json!({ "array_int64": values }).to_string();
            m.unmarshal_json(input.as_bytes()).unwrap();
        }
        let expected = FieldValue::Repeated(Some(second.iter().map(|&v| Value::I64(v)).collect()));
        prop_assert_eq!(m.get("array_int64").unwrap(), &expected);
    }

    #[test]
    fn prop_map_decode_merges(
        first in proptest::collection::btree_map(any::<i64>(), any::<i32>(), 0..12),
        second in proptest::collection::btree_map(any::<i64>(), any::<i32>(), 0..12),
    ) {
        let mut m = message_type("UnmarshalData").new_message();
        for entries in [&first, &second] {
            let object: BTreeMap<String, i32> =
                entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            let input = serde_json::json!({ "map_sint64_int32": object }).to_string();
            m.unmarshal_json(input.as_bytes()).unwrap();
        }
        let mut expected = IndexMap::new();
        for (k, v) in first.iter().chain(second.iter()) {
            expected.insert(MapKey::I64(*k), Value::I32(*v));
        }
        prop_assert_eq!(m.get("map_sint64_int32").unwrap(), &FieldValue::Map(Some(expected)));
    }

    #[test]
    fn prop_arbitrary_input_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut m = message_type("OneofNotHide").new_message();
        let _ = m.unmarshal_json(&data);
        let _ = m.marshal_json();
    }

    #[test]
    fn prop_failed_scalar_decode_keeps_old_value(old in any::<i32>(), junk in "[a-z]{1,8}") {
        let mut m = message_type("UnmarshalData").new_message();
        m.set_value("t_int32", old).unwrap();
        let input = format!(r#"{{"t_int32": "{junk}"}}"#);
        prop_assert!(m.unmarshal_json(input.as_bytes()).is_err());
        prop_assert_eq!(m.get("t_int32").unwrap(), &FieldValue::Singular(Value::I32(old)));
    }
}
