//! # Attribute Record - Binary Selective Serialization
//!
//! ## Purpose
//!
//! One schema-typed object whose fields are synchronized selectively. Local
//! setters mark fields dirty; [`AttributeRecord::encode`] emits only the dirty
//! fields and clears them. Incoming values land through
//! [`AttributeRecord::decode`], which records them as received changes without
//! re-arming outbound dirtiness.
//!
//! ## Update Frame Layout
//!
//! ```text
//! ┌───────────────┬───────────┬─────────────┬───────────┬─────────────┬─────┐
//! │ count: u32 BE │ index: u8 │ value bytes │ index: u8 │ value bytes │ ... │
//! └───────────────┴───────────┴─────────────┴───────────┴─────────────┴─────┘
//! ```
//!
//! Indices are written in ascending order. Value bytes carry no type tag; the
//! receiver decodes each value with the type its own schema declares for that
//! index.

use crate::error::{StateError, StateResult};
use crate::schema::Schema;
use codec::{BufferReader, BufferWriter, FieldValue};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AttributeRecord {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
    dirty: BTreeSet<usize>,
    received: BTreeSet<usize>,
}

impl AttributeRecord {
    /// Create a record holding the schema's default values, nothing dirty
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema.defaults();
        Self {
            schema,
            values,
            dirty: BTreeSet::new(),
            received: BTreeSet::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn out_of_range(&self, index: usize) -> StateError {
        StateError::FieldIndexOutOfRange {
            index,
            record: self.schema.name().to_string(),
            field_count: self.schema.len(),
        }
    }

    /// Mark field `index` dirty
    ///
    /// Setters call this themselves. Call it directly only after mutating a
    /// nested value in place through [`AttributeRecord::field_mut`].
    pub fn select(&mut self, index: usize) -> StateResult<()> {
        if index >= self.schema.len() {
            return Err(self.out_of_range(index));
        }
        self.dirty.insert(index);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.dirty.extend(0..self.schema.len());
    }

    pub fn unselect_all(&mut self) {
        self.dirty.clear();
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.dirty.contains(&index)
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.iter().copied()
    }

    /// Returns true and clears the mark iff field `index` is dirty
    pub fn write_select(&mut self, index: usize) -> bool {
        self.dirty.remove(&index)
    }

    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldValue> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }

    /// In-place access for nested values; follow with [`select`](Self::select)
    pub fn field_mut(&mut self, index: usize) -> Option<&mut FieldValue> {
        self.values.get_mut(index)
    }

    /// Write a value and mark the field dirty
    ///
    /// A value whose kind does not match the schema is rejected and the record
    /// is left unchanged.
    pub fn set_field(&mut self, index: usize, value: impl Into<FieldValue>) -> StateResult<()> {
        let value = value.into();
        let def = self.schema.field(index).ok_or_else(|| self.out_of_range(index))?;
        if !def.field_type.accepts(&value) {
            return Err(StateError::type_mismatch(
                &def.name,
                def.field_type.name(),
                value.kind_name(),
            ));
        }
        self.values[index] = value;
        self.dirty.insert(index);
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: impl Into<FieldValue>) -> StateResult<()> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| StateError::unknown_field(name, self.schema.name()))?;
        self.set_field(index, value)
    }

    /// Emit every dirty field into `sink` and clear its dirty mark
    ///
    /// A field whose value no longer fits the schema (possible after an
    /// in-place edit through [`field_mut`](Self::field_mut)) is left out of
    /// the frame and stays dirty. Returns the number of fields written.
    pub fn encode(&mut self, sink: &mut BufferWriter) -> usize {
        let mut body = BufferWriter::new();
        let mut emitted = Vec::new();
        for index in self.dirty.iter().copied() {
            let def = &self.schema.fields()[index];
            let mut slot = BufferWriter::new();
            slot.write_u8(index as u8);
            match slot.write_value(&def.field_type, &self.values[index]) {
                Ok(()) => {
                    body.write_bytes(slot.as_slice());
                    emitted.push(index);
                }
                Err(e) => warn!(
                    record = self.schema.name(),
                    field = %def.name,
                    error = %e,
                    "Field held back from update frame"
                ),
            }
        }

        for index in &emitted {
            self.dirty.remove(index);
        }
        sink.write_u32(emitted.len() as u32);
        sink.write_bytes(body.as_slice());
        emitted.len()
    }

    /// Read and apply the value for field `index`
    ///
    /// Incoming values win over a pending local change for the same field.
    pub fn decode(&mut self, index: usize, source: &mut BufferReader<'_>) -> StateResult<()> {
        let value = self.read_field(index, source)?;
        self.apply_received(index, value);
        Ok(())
    }

    fn read_field(&self, index: usize, source: &mut BufferReader<'_>) -> StateResult<FieldValue> {
        let def = self.schema.field(index).ok_or_else(|| self.out_of_range(index))?;
        Ok(source.read_value(&def.field_type)?)
    }

    fn apply_received(&mut self, index: usize, value: FieldValue) {
        if self.dirty.remove(&index) {
            debug!(
                record = self.schema.name(),
                field = %self.schema.fields()[index].name,
                "Incoming update superseded pending local value"
            );
        }
        self.values[index] = value;
        self.received.insert(index);
    }

    /// Decode one update frame produced by a peer's [`encode`](Self::encode)
    ///
    /// The frame is staged before anything is applied, so a malformed frame
    /// leaves every field untouched. Returns the indices that were applied.
    pub fn decode_update(&mut self, source: &mut BufferReader<'_>) -> StateResult<Vec<usize>> {
        let count = source.read_u32()? as usize;
        let mut staged = Vec::with_capacity(count.min(self.schema.len()));
        for _ in 0..count {
            let index = usize::from(source.read_u8()?);
            let value = self.read_field(index, source)?;
            staged.push((index, value));
        }

        let applied = staged.iter().map(|(i, _)| *i).collect();
        for (index, value) in staged {
            self.apply_received(index, value);
        }
        Ok(applied)
    }

    /// Drain the set of fields changed by the peer since the last call
    pub fn take_received(&mut self) -> BTreeSet<usize> {
        std::mem::take(&mut self.received)
    }

    /// Render all fields as one object keyed by field name
    pub fn to_keyed_json(&self) -> Value {
        codec::to_keyed_object(
            self.schema
                .fields()
                .iter()
                .zip(&self.values)
                .map(|(def, value)| (def.name.as_str(), value)),
        )
    }
}

/// Value equality over every field except presentation-only ones
impl PartialEq for AttributeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.values.len() == other.values.len()
            && self
                .schema
                .fields()
                .iter()
                .zip(self.values.iter().zip(&other.values))
                .all(|(def, (a, b))| def.presentation_only || a == b)
    }
}
