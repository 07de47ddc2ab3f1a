//! # Field Type Model
//!
//! ## Purpose
//!
//! Declares the closed set of field types an attribute schema can use and the
//! runtime value that fills each slot. Schemas are flat, generated data; the
//! codec only ever sees them through [`FieldType`] and [`FieldValue`].
//!
//! ## Type Table
//!
//! | Type            | Binary encoding                         | JSON encoding   |
//! |-----------------|-----------------------------------------|-----------------|
//! | `Bool`          | 1 byte                                  | `true`/`false`  |
//! | `Int`           | i32, big-endian                         | number          |
//! | `Double`        | f64, big-endian                         | number          |
//! | `String`        | u32 byte length + UTF-8                 | string          |
//! | `Enum`          | i32 ordinal                             | number          |
//! | `*Array`        | u32 count + elements                    | array           |
//! | `Vector`        | `len` elements, no count                | array           |
//! | `Nested`        | each nested field, in nested order      | array           |
//!
//! No type tags travel on the wire. Reader and writer share the schema.

use std::fmt;
use std::sync::Arc;

/// Element type of a fixed-length vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Double,
    String,
}

/// Declared type of one schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    Int,
    Double,
    String,
    /// Enumeration carried as its ordinal
    Enum { variants: Arc<[&'static str]> },
    BoolArray,
    IntArray,
    DoubleArray,
    StringArray,
    /// Fixed-length vector; length comes from the schema, not the wire
    Vector { element: ScalarType, len: usize },
    /// Nested record written with its own field order
    Nested(Arc<[FieldType]>),
}

impl FieldType {
    /// Build an enum field type from its variant names
    pub fn enumeration(variants: &[&'static str]) -> Self {
        FieldType::Enum {
            variants: Arc::from(variants),
        }
    }

    /// Build a nested field type from the nested schema's field types
    pub fn nested(fields: Vec<FieldType>) -> Self {
        FieldType::Nested(Arc::from(fields))
    }

    /// Value a freshly constructed record holds for this field
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Int => FieldValue::Int(0),
            FieldType::Double => FieldValue::Double(0.0),
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Enum { .. } => FieldValue::Enum(0),
            FieldType::BoolArray => FieldValue::BoolArray(Vec::new()),
            FieldType::IntArray => FieldValue::IntArray(Vec::new()),
            FieldType::DoubleArray => FieldValue::DoubleArray(Vec::new()),
            FieldType::StringArray => FieldValue::StringArray(Vec::new()),
            FieldType::Vector { element, len } => {
                FieldValue::Vector((0..*len).map(|_| element.default_value()).collect())
            }
            FieldType::Nested(fields) => {
                FieldValue::Nested(fields.iter().map(FieldType::default_value).collect())
            }
        }
    }

    /// Whether `value` is an acceptable value for this field type
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldType::Bool, FieldValue::Bool(_))
            | (FieldType::Int, FieldValue::Int(_))
            | (FieldType::Double, FieldValue::Double(_))
            | (FieldType::String, FieldValue::String(_))
            | (FieldType::BoolArray, FieldValue::BoolArray(_))
            | (FieldType::IntArray, FieldValue::IntArray(_))
            | (FieldType::DoubleArray, FieldValue::DoubleArray(_))
            | (FieldType::StringArray, FieldValue::StringArray(_)) => true,
            (FieldType::Enum { variants }, FieldValue::Enum(ordinal)) => {
                *ordinal >= 0 && (*ordinal as usize) < variants.len()
            }
            (FieldType::Vector { element, len }, FieldValue::Vector(items)) => {
                items.len() == *len && items.iter().all(|item| element.accepts(item))
            }
            (FieldType::Nested(fields), FieldValue::Nested(items)) => {
                fields.len() == items.len()
                    && fields.iter().zip(items).all(|(ty, item)| ty.accepts(item))
            }
            _ => false,
        }
    }

    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::String => "string",
            FieldType::Enum { .. } => "enum",
            FieldType::BoolArray => "bool[]",
            FieldType::IntArray => "int[]",
            FieldType::DoubleArray => "double[]",
            FieldType::StringArray => "string[]",
            FieldType::Vector { .. } => "vector",
            FieldType::Nested(_) => "nested",
        }
    }
}

impl ScalarType {
    pub fn default_value(&self) -> FieldValue {
        match self {
            ScalarType::Bool => FieldValue::Bool(false),
            ScalarType::Int => FieldValue::Int(0),
            ScalarType::Double => FieldValue::Double(0.0),
            ScalarType::String => FieldValue::String(String::new()),
        }
    }

    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (ScalarType::Bool, FieldValue::Bool(_))
                | (ScalarType::Int, FieldValue::Int(_))
                | (ScalarType::Double, FieldValue::Double(_))
                | (ScalarType::String, FieldValue::String(_))
        )
    }

    pub fn as_field_type(&self) -> FieldType {
        match self {
            ScalarType::Bool => FieldType::Bool,
            ScalarType::Int => FieldType::Int,
            ScalarType::Double => FieldType::Double,
            ScalarType::String => FieldType::String,
        }
    }
}

/// Current value of one schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    Enum(i32),
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    Vector(Vec<FieldValue>),
    Nested(Vec<FieldValue>),
}

impl FieldValue {
    /// Short kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Double(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::Enum(_) => "enum",
            FieldValue::BoolArray(_) => "bool[]",
            FieldValue::IntArray(_) => "int[]",
            FieldValue::DoubleArray(_) => "double[]",
            FieldValue::StringArray(_) => "string[]",
            FieldValue::Vector(_) => "vector",
            FieldValue::Nested(_) => "nested",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) | FieldValue::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::json::to_json(self))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<Vec<i32>> for FieldValue {
    fn from(v: Vec<i32>) -> Self {
        FieldValue::IntArray(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        FieldValue::DoubleArray(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::StringArray(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_declared_types() {
        let types = vec![
            FieldType::Bool,
            FieldType::Int,
            FieldType::Double,
            FieldType::String,
            FieldType::enumeration(&["Linear", "Log"]),
            FieldType::IntArray,
            FieldType::Vector {
                element: ScalarType::Double,
                len: 3,
            },
            FieldType::nested(vec![FieldType::Int, FieldType::String]),
        ];
        for ty in types {
            assert!(ty.accepts(&ty.default_value()), "default for {}", ty.name());
        }
    }

    #[test]
    fn enum_ordinal_is_range_checked() {
        let ty = FieldType::enumeration(&["A", "B"]);
        assert!(ty.accepts(&FieldValue::Enum(1)));
        assert!(!ty.accepts(&FieldValue::Enum(2)));
        assert!(!ty.accepts(&FieldValue::Enum(-1)));
        assert!(!ty.accepts(&FieldValue::Int(0)));
    }

    #[test]
    fn vector_length_is_checked() {
        let ty = FieldType::Vector {
            element: ScalarType::Int,
            len: 2,
        };
        assert!(ty.accepts(&FieldValue::Vector(vec![1.into(), 2.into()])));
        assert!(!ty.accepts(&FieldValue::Vector(vec![1.into()])));
        assert!(!ty.accepts(&FieldValue::Vector(vec![1.into(), 2.5.into()])));
    }
}
