//! State Error Types
//!
//! Errors raised while mutating records or applying peer updates. None of
//! these end a session: the caller logs the error and drops the offending
//! mutation or message.

use codec::CodecError;
use thiserror::Error;

/// Main state error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Field name not present in the record's schema or api table
    #[error("Unknown field '{key}' in {record}")]
    UnknownField { key: String, record: String },

    /// Field index beyond the schema
    #[error("Field index {index} out of range for {record} ({field_count} fields)")]
    FieldIndexOutOfRange {
        index: usize,
        record: String,
        field_count: usize,
    },

    /// Value kind does not match the field
    #[error("Type mismatch on field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// Schema definition is inconsistent
    #[error("Invalid schema '{schema}': {message}")]
    InvalidSchema { schema: String, message: String },

    /// Update message carried no usable record id
    #[error("Update rejected: missing or invalid record id")]
    MissingId,

    /// Record id beyond the registry's growth limit
    #[error("Record id {id} exceeds limit {limit}")]
    IdOutOfRange { id: u64, limit: usize },

    /// Update message is neither an `api` nor a `data` message
    #[error("Unrecognized update message: {message}")]
    UnrecognizedMessage { message: String },

    /// Binary decode failure
    #[error("Decode error: {0}")]
    Codec(#[from] CodecError),
}

impl StateError {
    pub fn unknown_field(key: impl Into<String>, record: impl Into<String>) -> Self {
        Self::UnknownField {
            key: key.into(),
            record: record.into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn invalid_schema(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema: schema.into(),
            message: message.into(),
        }
    }

    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::UnrecognizedMessage {
            message: message.into(),
        }
    }
}

/// Result type alias for state operations
pub type StateResult<T> = std::result::Result<T, StateError>;
