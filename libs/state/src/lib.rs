//! # Attribute State
//!
//! Records whose fields synchronize selectively with a remote peer, and the
//! registry that addresses them by id.
//!
//! ## Architecture Role
//!
//! ```text
//! codec (field rules) → [state] → network (framer, session) → rpc
//!                         ↓
//!              AttributeRecord  (binary, schema-typed)
//!              KeyedRecord      (textual, api-keyed)
//!              Registry         (id → KeyedRecord, grows on demand)
//!              RecordSet        (id → AttributeRecord, grows on demand)
//! ```
//!
//! ## Mutation Paths
//!
//! - Local setters write a value and mark the field dirty
//! - Peer updates write a value and record a received change; they never
//!   re-arm outbound dirtiness
//! - Flush/encode emits dirty fields only and clears them

pub mod error;
pub mod events;
pub mod keyed;
pub mod record;
pub mod record_set;
pub mod registry;
pub mod schema;

pub use error::{StateError, StateResult};
pub use events::{RecordEvent, RecordEventKind};
pub use keyed::KeyedRecord;
pub use record::AttributeRecord;
pub use record_set::{RecordSet, SchemaResolver};
pub use registry::{Registry, SharedRegistry, MAX_RECORD_ID};
pub use schema::{FieldDef, Schema, SchemaBuilder};
