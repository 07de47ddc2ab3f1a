//! Selective synchronization properties
//!
//! Exercises records and the registry the way a session does: interleaved
//! local sets, flushes and peer updates.

use codec::{BufferReader, BufferWriter, FieldType, FieldValue, ScalarType};
use proptest::prelude::*;
use serde_json::{json, Value};
use state::{AttributeRecord, Registry, Schema};
use std::collections::BTreeMap;

const KEYS: [&str; 4] = ["RPCType", "windowId", "variable", "boolFlag"];

fn rpc_registry() -> Registry {
    let mut reg = Registry::new();
    reg.update(&json!({
        "id": 0,
        "api": {"RPCType": 0, "windowId": 1, "variable": 2, "boolFlag": 3}
    }))
    .unwrap();
    reg.update(&json!({
        "id": 0,
        "contents": [0, 1, "", false],
        "metadata": ["ViewerRPCType", "int", "string", "bool"]
    }))
    .unwrap();
    reg
}

fn value_for(key: usize, seed: i32) -> Value {
    match key {
        0 | 1 => json!(seed),
        2 => json!(format!("var{seed}")),
        _ => json!(seed % 2 == 0),
    }
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, i32),
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..KEYS.len(), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => Just(Op::Flush),
    ]
}

proptest! {
    #[test]
    fn prop_flush_contains_exactly_fields_set_since_last_flush(
        ops in proptest::collection::vec(op_strategy(), 0..40)
    ) {
        let mut reg = rpc_registry();
        let mut expected: BTreeMap<String, Value> = BTreeMap::new();

        for op in ops.into_iter().chain(std::iter::once(Op::Flush)) {
            match op {
                Op::Set(key, seed) => {
                    let value = value_for(key, seed);
                    prop_assert!(reg.set_field(0, KEYS[key], value.clone()));
                    expected.insert(key.to_string(), value);
                }
                Op::Flush => {
                    let msg = reg.flush(0).unwrap();
                    let contents: BTreeMap<String, Value> =
                        serde_json::from_value(msg["contents"].clone()).unwrap();
                    prop_assert_eq!(&contents, &expected);

                    let metadata = msg["metadata"].as_object().unwrap();
                    prop_assert_eq!(metadata.len(), expected.len());
                    prop_assert!(reg.get(0).unwrap().pending().is_empty());
                    expected.clear();
                }
            }
        }
    }

    #[test]
    fn prop_registry_covers_every_referenced_id(ids in proptest::collection::vec(0usize..512, 1..32)) {
        let mut reg = Registry::new();
        for id in &ids {
            reg.update(&json!({"id": id, "contents": [id]})).unwrap();
        }
        let max = *ids.iter().max().unwrap();
        prop_assert!(reg.len() >= max + 1);
        for id in 0..=max {
            prop_assert!(reg.get(id).is_some());
        }
        for id in &ids {
            prop_assert_eq!(reg.get_field(*id, "missing"), None);
            prop_assert_eq!(&reg.get(*id).unwrap().contents()[0], &json!(id));
        }
    }
}

fn every_type_schema() -> std::sync::Arc<Schema> {
    Schema::builder("EveryType")
        .field("flag", FieldType::Bool)
        .field("count", FieldType::Int)
        .field("scale", FieldType::Double)
        .field("label", FieldType::String)
        .field("mode", FieldType::enumeration(&["Off", "On", "Auto"]))
        .field("mask", FieldType::BoolArray)
        .field("ids", FieldType::IntArray)
        .field("levels", FieldType::DoubleArray)
        .field("names", FieldType::StringArray)
        .field(
            "origin",
            FieldType::Vector {
                element: ScalarType::Double,
                len: 3,
            },
        )
        .field(
            "colorAttr",
            FieldType::nested(vec![FieldType::IntArray, FieldType::String]),
        )
        .presentation_field("expanded", FieldType::Bool)
        .build()
        .unwrap()
}

#[test_log::test]
fn dirty_fields_round_trip_into_fresh_record() {
    let schema = every_type_schema();
    let mut original = AttributeRecord::new(schema.clone());
    original.set_by_name("flag", true).unwrap();
    original.set_by_name("count", 12).unwrap();
    original.set_by_name("scale", 0.125).unwrap();
    original.set_by_name("label", "Temperature (K)").unwrap();
    original.set_by_name("mode", FieldValue::Enum(2)).unwrap();
    original
        .set_by_name("mask", FieldValue::BoolArray(vec![true, false]))
        .unwrap();
    original.set_by_name("ids", vec![4, 8, 15]).unwrap();
    original.set_by_name("levels", vec![0.1, 0.2]).unwrap();
    original
        .set_by_name("names", vec!["Mesh".to_string(), "Vector".to_string()])
        .unwrap();
    original
        .set_by_name(
            "origin",
            FieldValue::Vector(vec![1.0.into(), 2.0.into(), 3.0.into()]),
        )
        .unwrap();
    original
        .set_by_name(
            "colorAttr",
            FieldValue::Nested(vec![vec![255, 0, 0].into(), "red".into()]),
        )
        .unwrap();
    let snapshot = original.clone();

    let mut sink = BufferWriter::new();
    assert_eq!(original.encode(&mut sink), 11);
    assert_eq!(original.dirty_fields().count(), 0);

    let bytes = sink.freeze();
    let mut fresh = AttributeRecord::new(schema);
    let applied = fresh.decode_update(&mut BufferReader::new(&bytes)).unwrap();
    assert_eq!(applied.len(), 11);
    assert_eq!(fresh, snapshot);
    assert_eq!(fresh.dirty_fields().count(), 0);
}

#[test]
fn encode_with_nothing_dirty_writes_empty_frame() {
    let mut rec = AttributeRecord::new(every_type_schema());
    let mut sink = BufferWriter::new();
    assert_eq!(rec.encode(&mut sink), 0);

    let bytes = sink.freeze();
    let mut fresh = AttributeRecord::new(every_type_schema());
    let before = fresh.clone();
    assert!(fresh
        .decode_update(&mut BufferReader::new(&bytes))
        .unwrap()
        .is_empty());
    assert_eq!(fresh, before);
}

#[test]
fn nested_in_place_mutation_requires_select() {
    let mut rec = AttributeRecord::new(every_type_schema());
    let index = rec.schema().index_of("colorAttr").unwrap();
    if let Some(FieldValue::Nested(items)) = rec.field_mut(index) {
        items[1] = "blue".into();
    }
    assert!(!rec.is_dirty(index));
    rec.select(index).unwrap();
    assert!(rec.is_dirty(index));
}

#[test]
fn nonconforming_field_is_held_back_and_frame_stays_readable() {
    let schema = Schema::builder("SaveWindowAttributes")
        .field("fileName", FieldType::String)
        .field("width", FieldType::Int)
        .build()
        .unwrap();
    let mut rec = AttributeRecord::new(schema.clone());
    if let Some(slot) = rec.field_mut(0) {
        *slot = FieldValue::Int(7);
    }
    rec.select(0).unwrap();
    rec.set_field(1, 42).unwrap();

    let mut sink = BufferWriter::new();
    assert_eq!(rec.encode(&mut sink), 1);
    assert_eq!(sink.as_slice(), &[0, 0, 0, 1, 1, 0, 0, 0, 42]);
    assert!(rec.is_dirty(0));
    assert!(!rec.is_dirty(1));

    let bytes = sink.freeze();
    let mut peer = AttributeRecord::new(schema);
    assert_eq!(
        peer.decode_update(&mut BufferReader::new(&bytes)).unwrap(),
        vec![1]
    );
    assert_eq!(peer.field(1), Some(&FieldValue::Int(42)));
    assert_eq!(peer.field(0), Some(&FieldValue::String(String::new())));
}
