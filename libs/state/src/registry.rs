//! # Record Registry
//!
//! ## Purpose
//!
//! Ordered, append-only collection of [`KeyedRecord`]s addressed by id. Peer
//! updates for ids beyond the current size grow the registry with empty
//! placeholders, so every id below a referenced id always exists.
//!
//! ## Message Shapes
//!
//! ```text
//! api:   {"id": 3, "api": {"fieldName": 0, ...}}
//! data:  {"id": 3, "contents": [v0, v1, ...], "metadata": [m0, m1, ...]}
//! flush: {"id": 0, "contents": {"4": v4}, "metadata": {"4": m4}}
//! ```
//!
//! ## Locking
//!
//! The registry itself is not synchronized. Sessions share it as a
//! [`SharedRegistry`]; the read loop, local setters and flushes all take the
//! same lock.

use crate::error::{StateError, StateResult};
use crate::events::{RecordEvent, RecordEventKind, EVENT_CHANNEL_CAPACITY};
use crate::keyed::KeyedRecord;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Growth ceiling for peer-supplied ids
pub const MAX_RECORD_ID: usize = 1 << 16;

/// Registry handle shared between the read loop and local callers
pub type SharedRegistry = Arc<Mutex<Registry>>;

#[derive(Debug)]
pub struct Registry {
    records: Vec<KeyedRecord>,
    events: broadcast::Sender<RecordEvent>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: Vec::new(),
            events,
        }
    }

    /// Create a registry wrapped for sharing
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Receive a [`RecordEvent`] for every applied update
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    /// Grow so that `id` exists; never shrinks
    pub fn ensure(&mut self, id: usize) -> &mut KeyedRecord {
        if id >= self.records.len() {
            debug!(from = self.records.len(), to = id + 1, "Growing registry");
            self.records.resize_with(id + 1, KeyedRecord::new);
        }
        &mut self.records[id]
    }

    /// Apply one peer message
    ///
    /// Rejected messages leave the registry untouched; the caller logs and
    /// drops them.
    pub fn update(&mut self, message: &Value) -> StateResult<RecordEvent> {
        let obj = message
            .as_object()
            .ok_or_else(|| StateError::unrecognized("update is not an object"))?;
        let id = parse_id(obj.get("id"))?;

        let kind = if let Some(api) = obj.get("api") {
            let api = api
                .as_object()
                .ok_or_else(|| StateError::unrecognized("api is not an object"))?;
            let table = KeyedRecord::parse_api(api)?;
            self.ensure(id).install_api(table);
            RecordEventKind::Api
        } else if let Some(contents) = obj.get("contents") {
            let contents = contents
                .as_array()
                .ok_or_else(|| StateError::unrecognized("contents is not an array"))?
                .clone();
            let metadata = obj.get("metadata").and_then(Value::as_array).cloned();
            let changed = self.ensure(id).apply_data(contents, metadata);
            RecordEventKind::Data { changed }
        } else {
            return Err(StateError::unrecognized(format!(
                "record {id} message has neither api nor contents"
            )));
        };

        let event = RecordEvent { id, kind };
        trace!(?event, "Applied update");
        // No subscribers is fine
        let _ = self.events.send(event.clone());
        Ok(event)
    }

    pub fn get(&self, id: usize) -> Option<&KeyedRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut KeyedRecord> {
        self.records.get_mut(id)
    }

    /// Current value of `key` in record `id`; absent for unknown ids or keys
    pub fn get_field(&self, id: usize, key: &str) -> Option<Value> {
        self.records.get(id).and_then(|r| r.get(key)).cloned()
    }

    /// Stage a local change; unknown ids are a silent no-op
    pub fn set_field(&mut self, id: usize, key: &str, value: Value) -> bool {
        match self.records.get_mut(id) {
            Some(record) => record.set(key, value),
            None => {
                trace!(id, key, "set_field on unknown record ignored");
                false
            }
        }
    }

    /// Build the flush message for record `id`; unknown ids yield nothing
    pub fn flush(&mut self, id: usize) -> Option<Value> {
        self.records.get_mut(id).map(|r| r.flush(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &KeyedRecord)> {
        self.records.iter().enumerate()
    }
}

fn parse_id(raw: Option<&Value>) -> StateResult<usize> {
    let id = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse::<u64>().ok(),
        _ => None,
    }
    .ok_or(StateError::MissingId)?;

    if id >= MAX_RECORD_ID as u64 {
        return Err(StateError::IdOutOfRange {
            id,
            limit: MAX_RECORD_ID,
        });
    }
    Ok(id as usize)
}
