//! Attribute schemas
//!
//! A schema is the flat, generated definition of one record type: an ordered
//! list of named, typed fields. The field index is authoritative on the wire;
//! the name table exists for keyed lookups at the API boundary.

use crate::error::{StateError, StateResult};
use codec::{FieldType, FieldValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Field indices travel as a single byte
pub const MAX_FIELDS: usize = 256;

/// One named, typed slot within a schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub default: FieldValue,
    /// Excluded from record equality (e.g. widget geometry)
    pub presentation_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDef>,
    index_by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Field types in index order, for nesting this schema in another
    pub fn as_nested_type(&self) -> FieldType {
        FieldType::nested(self.fields.iter().map(|f| f.field_type.clone()).collect())
    }

    pub(crate) fn defaults(&self) -> Vec<FieldValue> {
        self.fields.iter().map(|f| f.default.clone()).collect()
    }
}

/// Builder collecting field definitions in index order
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Add a field whose default is the type's zero value
    pub fn field(self, name: &str, field_type: FieldType) -> Self {
        let default = field_type.default_value();
        self.push(name, field_type, default, false)
    }

    pub fn field_with_default(
        self,
        name: &str,
        field_type: FieldType,
        default: impl Into<FieldValue>,
    ) -> Self {
        self.push(name, field_type, default.into(), false)
    }

    /// Add a field that does not participate in equality
    pub fn presentation_field(self, name: &str, field_type: FieldType) -> Self {
        let default = field_type.default_value();
        self.push(name, field_type, default, true)
    }

    fn push(
        mut self,
        name: &str,
        field_type: FieldType,
        default: FieldValue,
        presentation_only: bool,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            field_type,
            default,
            presentation_only,
        });
        self
    }

    pub fn build(self) -> StateResult<Arc<Schema>> {
        if self.fields.len() > MAX_FIELDS {
            return Err(StateError::invalid_schema(
                &self.name,
                format!("{} fields exceeds limit {}", self.fields.len(), MAX_FIELDS),
            ));
        }

        let mut index_by_name = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if !field.field_type.accepts(&field.default) {
                return Err(StateError::invalid_schema(
                    &self.name,
                    format!(
                        "default for '{}' is {}, field is {}",
                        field.name,
                        field.default.kind_name(),
                        field.field_type.name()
                    ),
                ));
            }
            if index_by_name.insert(field.name.clone(), index).is_some() {
                return Err(StateError::invalid_schema(
                    &self.name,
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }

        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
            index_by_name,
        }))
    }
}
