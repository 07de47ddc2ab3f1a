//! # Field Buffer Codec
//!
//! ## Purpose
//!
//! This crate contains the "Rules" layer of the synchronization stack: how a
//! single field value becomes bytes, and how it becomes structured text.
//! - Closed field type model ([`FieldType`], [`FieldValue`])
//! - Binary indexed encoding ([`BufferWriter`], [`BufferReader`])
//! - Keyed JSON encoding ([`to_json`], [`from_json`], [`JsonKind`])
//!
//! ## Architecture Role
//!
//! ```text
//! codec → state → network → rpc
//!   ↑       ↓        ↓
//! Field   Records  Sockets
//! Rules   Registry Framing
//! ```
//!
//! ## What This Crate Does Not Contain
//! - Per-feature schemas (generated data consumed through [`FieldType`])
//! - Dirty tracking (see the `state` crate)
//! - Sockets or framing (see the `network` crate)

pub mod buffers;
pub mod error;
pub mod field;
pub mod json;

pub use buffers::{BufferReader, BufferWriter, MAX_COLLECTION_LEN};
pub use error::{CodecError, CodecResult};
pub use field::{FieldType, FieldValue, ScalarType};
pub use json::{from_json, to_json, to_keyed_object, JsonKind};
