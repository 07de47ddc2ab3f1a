//! Change notifications published by the registry

use serde::{Deserialize, Serialize};

/// Capacity of the broadcast channel; lagging subscribers lose the oldest events
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// One successfully applied peer update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEvent {
    pub id: usize,
    pub kind: RecordEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordEventKind {
    /// The record's name→index table arrived
    Api,
    /// Field values arrived; `changed` lists indices whose value differs
    Data { changed: Vec<usize> },
}
