//! Typed record collection for the binary engine-facing transport
//!
//! Mirrors [`Registry`](crate::Registry) growth rules for
//! [`AttributeRecord`]s: an update for an unseen id fills every gap with
//! default-constructed records before decoding.

use crate::error::StateResult;
use crate::record::AttributeRecord;
use crate::registry::MAX_RECORD_ID;
use crate::schema::Schema;
use crate::StateError;
use codec::{BufferReader, BufferWriter};
use std::sync::Arc;
use tracing::debug;

/// Supplies the schema for a given record id
pub type SchemaResolver = Box<dyn Fn(usize) -> Arc<Schema> + Send + Sync>;

pub struct RecordSet {
    records: Vec<AttributeRecord>,
    resolve: SchemaResolver,
}

impl RecordSet {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(usize) -> Arc<Schema> + Send + Sync + 'static,
    {
        Self {
            records: Vec::new(),
            resolve: Box::new(resolve),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&AttributeRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut AttributeRecord> {
        self.records.get_mut(id)
    }

    pub fn ensure(&mut self, id: usize) -> StateResult<&mut AttributeRecord> {
        if id >= MAX_RECORD_ID {
            return Err(StateError::IdOutOfRange {
                id: id as u64,
                limit: MAX_RECORD_ID,
            });
        }
        while self.records.len() <= id {
            let schema = (self.resolve)(self.records.len());
            self.records.push(AttributeRecord::new(schema));
        }
        Ok(&mut self.records[id])
    }

    /// Decode one `id`-addressed update frame, growing as needed
    pub fn apply(&mut self, id: usize, source: &mut BufferReader<'_>) -> StateResult<Vec<usize>> {
        let applied = self.ensure(id)?.decode_update(source)?;
        debug!(id, fields = applied.len(), "Applied binary update");
        Ok(applied)
    }

    /// Write record `id` as `u32 id` followed by its dirty-field frame
    ///
    /// Unknown ids write nothing and return `None`.
    pub fn encode_dirty(&mut self, id: usize, sink: &mut BufferWriter) -> Option<usize> {
        let record = self.records.get_mut(id)?;
        sink.write_u32(id as u32);
        Some(record.encode(sink))
    }
}
