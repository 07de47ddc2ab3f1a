//! Keyed structured-text path
//!
//! Parallel to the binary buffers, the textual client represents each field
//! as a JSON value. Arrays and nested records use JSON's native arrays, so no
//! length prefixes or ordering contract is needed beyond the field index.

use crate::error::{CodecError, CodecResult};
use crate::field::{FieldType, FieldValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Coarse JSON value classification used for keyed-set kind checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    /// Whether a value of kind `other` may replace a value of this kind
    ///
    /// `Null` means the slot has never been populated and accepts anything.
    pub fn admits(self, other: JsonKind) -> bool {
        self == JsonKind::Null || self == other
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Render a field value as JSON
pub fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Bool(v) => Value::from(*v),
        FieldValue::Int(v) | FieldValue::Enum(v) => Value::from(*v),
        FieldValue::Double(v) => Value::from(*v),
        FieldValue::String(v) => Value::from(v.as_str()),
        FieldValue::BoolArray(v) => Value::from(v.clone()),
        FieldValue::IntArray(v) => Value::from(v.clone()),
        FieldValue::DoubleArray(v) => Value::from(v.clone()),
        FieldValue::StringArray(v) => Value::from(v.clone()),
        FieldValue::Vector(items) | FieldValue::Nested(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
    }
}

fn mismatch(ty: &FieldType, value: &Value) -> CodecError {
    CodecError::kind_mismatch(ty.name(), JsonKind::of(value).to_string())
}

fn json_int(ty: &FieldType, value: &Value) -> CodecResult<i32> {
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| mismatch(ty, value))
}

fn json_array<'v>(ty: &FieldType, value: &'v Value) -> CodecResult<&'v Vec<Value>> {
    value.as_array().ok_or_else(|| mismatch(ty, value))
}

/// Interpret a JSON value as the declared field type
///
/// Enum fields accept either the ordinal or the variant name.
pub fn from_json(value: &Value, ty: &FieldType) -> CodecResult<FieldValue> {
    let out = match ty {
        FieldType::Bool => FieldValue::Bool(value.as_bool().ok_or_else(|| mismatch(ty, value))?),
        FieldType::Int => FieldValue::Int(json_int(ty, value)?),
        FieldType::Double => {
            FieldValue::Double(value.as_f64().ok_or_else(|| mismatch(ty, value))?)
        }
        FieldType::String => FieldValue::String(
            value
                .as_str()
                .ok_or_else(|| mismatch(ty, value))?
                .to_string(),
        ),
        FieldType::Enum { variants } => {
            let ordinal = match value {
                Value::String(name) => variants
                    .iter()
                    .position(|v| v == name)
                    .map(|p| p as i32)
                    .ok_or_else(|| CodecError::kind_mismatch("enum variant", name.clone()))?,
                _ => json_int(ty, value)?,
            };
            FieldValue::Enum(ordinal)
        }
        FieldType::BoolArray => FieldValue::BoolArray(
            json_array(ty, value)?
                .iter()
                .map(|v| v.as_bool().ok_or_else(|| mismatch(ty, v)))
                .collect::<CodecResult<_>>()?,
        ),
        FieldType::IntArray => FieldValue::IntArray(
            json_array(ty, value)?
                .iter()
                .map(|v| json_int(ty, v))
                .collect::<CodecResult<_>>()?,
        ),
        FieldType::DoubleArray => FieldValue::DoubleArray(
            json_array(ty, value)?
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| mismatch(ty, v)))
                .collect::<CodecResult<_>>()?,
        ),
        FieldType::StringArray => FieldValue::StringArray(
            json_array(ty, value)?
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| mismatch(ty, v))
                })
                .collect::<CodecResult<_>>()?,
        ),
        FieldType::Vector { element, len } => {
            let items = json_array(ty, value)?;
            if items.len() != *len {
                return Err(CodecError::VectorLength {
                    expected: *len,
                    got: items.len(),
                });
            }
            let element_type = element.as_field_type();
            FieldValue::Vector(
                items
                    .iter()
                    .map(|v| from_json(v, &element_type))
                    .collect::<CodecResult<_>>()?,
            )
        }
        FieldType::Nested(fields) => {
            let items = json_array(ty, value)?;
            if items.len() != fields.len() {
                return Err(CodecError::VectorLength {
                    expected: fields.len(),
                    got: items.len(),
                });
            }
            FieldValue::Nested(
                items
                    .iter()
                    .zip(fields.iter())
                    .map(|(v, t)| from_json(v, t))
                    .collect::<CodecResult<_>>()?,
            )
        }
    };

    if !ty.accepts(&out) {
        return Err(CodecError::kind_mismatch(ty.name(), out.kind_name()));
    }
    Ok(out)
}

/// Render named values as one object keyed by field name
pub fn to_keyed_object<'a, I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'a str, &'a FieldValue)>,
{
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), to_json(value)))
        .collect();
    Value::Object(map)
}
