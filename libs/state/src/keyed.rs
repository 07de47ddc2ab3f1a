//! Keyed Record - Textual Selective Serialization
//!
//! The textual client never compiles schemas in. Each record learns its
//! name→index table from a one-time `api` message and its values from `data`
//! messages whose `contents`/`metadata` arrays are aligned to field index.
//! Local changes accumulate in a pending map keyed by index until
//! [`KeyedRecord::flush`] turns them into one outbound message.

use crate::error::{StateError, StateResult};
use codec::JsonKind;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedRecord {
    api: HashMap<String, usize>,
    contents: Vec<Value>,
    metadata: Vec<Value>,
    pending: BTreeMap<usize, Value>,
}

impl KeyedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an `api` message has been applied
    pub fn has_api(&self) -> bool {
        !self.api.is_empty()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.api.get(key).copied()
    }

    /// Field names ordered by index
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> =
            self.api.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        names.sort_by_key(|(_, index)| *index);
        names.into_iter().map(|(name, _)| name).collect()
    }

    pub fn contents(&self) -> &[Value] {
        &self.contents
    }

    pub fn metadata(&self) -> &[Value] {
        &self.metadata
    }

    /// Locally set values not yet flushed
    pub fn pending(&self) -> &BTreeMap<usize, Value> {
        &self.pending
    }

    /// Drop staged values without sending them
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Install the name→index table
    pub fn apply_api(&mut self, api: &Map<String, Value>) -> StateResult<()> {
        self.install_api(Self::parse_api(api)?);
        Ok(())
    }

    pub(crate) fn parse_api(api: &Map<String, Value>) -> StateResult<HashMap<String, usize>> {
        let mut table = HashMap::with_capacity(api.len());
        for (name, index) in api {
            let index = index
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| {
                    StateError::unrecognized(format!("api index for '{name}' is {index}"))
                })?;
            table.insert(name.clone(), index);
        }
        Ok(table)
    }

    pub(crate) fn install_api(&mut self, table: HashMap<String, usize>) {
        self.api = table;
    }

    /// Merge the peer's values into the last-known state
    ///
    /// `contents[i]` replaces field `i`; fields beyond the array keep their
    /// value, so an empty update changes nothing. Returns the indices whose
    /// value changed. A pending local value for a changed index is dropped:
    /// the peer's state is authoritative for that field from here on. Pending
    /// values for other fields are kept.
    pub fn apply_data(&mut self, contents: Vec<Value>, metadata: Option<Vec<Value>>) -> Vec<usize> {
        let mut changed = Vec::new();
        for (index, value) in contents.into_iter().enumerate() {
            if self.contents.get(index) == Some(&value) {
                continue;
            }
            if self.pending.remove(&index).is_some() {
                debug!(field = index, "Incoming update superseded pending local value");
            }
            merge_at(&mut self.contents, index, value);
            changed.push(index);
        }

        for (index, meta) in metadata.into_iter().flatten().enumerate() {
            merge_at(&mut self.metadata, index, meta);
        }
        changed
    }

    /// Stage a local change for `key`
    ///
    /// Rejected (logged, record unchanged) when the key is unknown or the
    /// value's kind differs from the field's current kind.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        match self.check_set(key, &value) {
            Ok(index) => {
                self.pending.insert(index, value);
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Rejected field update");
                false
            }
        }
    }

    fn check_set(&self, key: &str, value: &Value) -> StateResult<usize> {
        let index = self
            .index_of(key)
            .ok_or_else(|| StateError::unknown_field(key, "keyed record"))?;
        let current = JsonKind::of(self.value_at(index).unwrap_or(&Value::Null));
        let incoming = JsonKind::of(value);
        if !current.admits(incoming) {
            return Err(StateError::type_mismatch(
                key,
                current.to_string(),
                incoming.to_string(),
            ));
        }
        Ok(index)
    }

    fn value_at(&self, index: usize) -> Option<&Value> {
        self.pending
            .get(&index)
            .or_else(|| self.contents.get(index))
    }

    /// Pending value for `key` if any, else the last-known value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index_of(key).and_then(|index| self.value_at(index))
    }

    /// Serialize pending changes as one flush message and clear them
    ///
    /// An empty pending map yields empty `contents`/`metadata` objects.
    pub fn flush(&mut self, id: usize) -> Value {
        let pending = std::mem::take(&mut self.pending);
        let mut contents = Map::with_capacity(pending.len());
        let mut metadata = Map::with_capacity(pending.len());
        for (index, value) in pending {
            let meta = self.metadata.get(index).cloned().unwrap_or(Value::Null);
            contents.insert(index.to_string(), value);
            metadata.insert(index.to_string(), meta);
        }
        json!({
            "id": id,
            "contents": contents,
            "metadata": metadata,
        })
    }
}

fn merge_at(slots: &mut Vec<Value>, index: usize, value: Value) {
    if index >= slots.len() {
        slots.resize(index + 1, Value::Null);
    }
    slots[index] = value;
}
