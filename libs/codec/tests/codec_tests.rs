//! # Codec Integration Tests
//!
//! Verifies the public codec API from outside the crate:
//! - Binary values read back in writer order, for every field type
//! - JSON conversion agrees with the binary path
//! - Truncated input fails without panicking

use codec::{
    from_json, to_json, BufferReader, BufferWriter, CodecError, FieldType, FieldValue, ScalarType,
};
use proptest::prelude::*;

fn sample_fields() -> Vec<(FieldType, FieldValue)> {
    vec![
        (FieldType::Bool, FieldValue::Bool(true)),
        (FieldType::Int, FieldValue::Int(-42)),
        (FieldType::Double, FieldValue::Double(3.25)),
        (FieldType::String, FieldValue::String("temperature".into())),
        (
            FieldType::enumeration(&["Zonal", "Nodal"]),
            FieldValue::Enum(1),
        ),
        (
            FieldType::BoolArray,
            FieldValue::BoolArray(vec![true, false, true]),
        ),
        (FieldType::IntArray, FieldValue::IntArray(vec![1, 1, 0])),
        (
            FieldType::DoubleArray,
            FieldValue::DoubleArray(vec![0.5, -1.0]),
        ),
        (
            FieldType::StringArray,
            FieldValue::StringArray(vec!["Mesh".into(), "Pseudocolor".into()]),
        ),
        (
            FieldType::Vector {
                element: ScalarType::Double,
                len: 3,
            },
            FieldValue::Vector(vec![1.0.into(), 2.0.into(), 3.0.into()]),
        ),
        (
            FieldType::nested(vec![FieldType::Int, FieldType::StringArray]),
            FieldValue::Nested(vec![
                FieldValue::Int(7),
                FieldValue::StringArray(vec!["a".into()]),
            ]),
        ),
    ]
}

#[test]
fn test_every_field_type_reads_back_in_order() {
    let fields = sample_fields();
    let mut writer = BufferWriter::new();
    for (ty, value) in &fields {
        writer.write_value(ty, value).unwrap();
    }

    let bytes = writer.freeze();
    let mut reader = BufferReader::new(&bytes);
    for (ty, value) in &fields {
        assert_eq!(&reader.read_value(ty).unwrap(), value);
    }
    assert!(reader.is_exhausted());
}

#[test]
fn test_json_path_matches_binary_values() {
    for (ty, value) in sample_fields() {
        let text = to_json(&value);
        assert_eq!(from_json(&text, &ty).unwrap(), value, "type {}", ty.name());
    }
}

#[test]
fn test_truncated_stream_is_an_error_not_a_panic() {
    let mut writer = BufferWriter::new();
    writer
        .write_string_array(&["one".to_string(), "two".to_string()])
        .unwrap();
    let bytes = writer.freeze();

    for cut in 0..bytes.len() {
        let mut reader = BufferReader::new(&bytes[..cut]);
        let result = reader.read_value(&FieldType::StringArray);
        assert!(
            matches!(result, Err(CodecError::Truncated { .. })),
            "cut at {cut}: {result:?}"
        );
    }
}

#[test]
fn test_wrong_read_type_desynchronizes_visibly() {
    // The wire is untagged: reading a string where an int was written
    // yields garbage or an error, never the original value.
    let mut writer = BufferWriter::new();
    writer.write_int(5);
    let bytes = writer.freeze();
    let mut reader = BufferReader::new(&bytes);
    assert!(reader.read_value(&FieldType::String).is_err());
}

proptest! {
    #[test]
    fn prop_int_and_string_arrays_survive(ints in proptest::collection::vec(any::<i32>(), 0..64),
                                          names in proptest::collection::vec(".{0,12}", 0..16)) {
        let mut writer = BufferWriter::new();
        writer.write_int_array(&ints).unwrap();
        writer.write_string_array(&names).unwrap();
        let bytes = writer.freeze();

        let mut reader = BufferReader::new(&bytes);
        prop_assert_eq!(reader.read_int_array().unwrap(), ints);
        prop_assert_eq!(reader.read_string_array().unwrap(), names);
        prop_assert!(reader.is_exhausted());
    }
}
