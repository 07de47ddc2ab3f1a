//! Codec-level errors for field encoding and decoding
//!
//! Provides error handling for the field buffer codec, including enough
//! context to tell which field and which byte offset went wrong. Every
//! decode failure is local to one message: callers drop the message and
//! keep the session alive.

use thiserror::Error;

/// Field codec errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Input ended before the expected value was complete
    #[error("Truncated input: need {need} bytes at offset {offset}, {remaining} remaining (reading: {context})")]
    Truncated {
        need: usize,
        offset: usize,
        remaining: usize,
        context: String,
    },

    /// String payload is not valid UTF-8
    #[error("Invalid UTF-8 string at offset {offset}: {detail}")]
    InvalidUtf8 { offset: usize, detail: String },

    /// Value kind does not match the declared field type
    #[error("Kind mismatch: field expects {expected}, got {got}")]
    KindMismatch { expected: String, got: String },

    /// Declared collection length exceeds codec limits
    #[error("Collection too large: {len} elements exceeds limit {limit} (offset: {offset})")]
    CollectionTooLarge {
        len: usize,
        limit: usize,
        offset: usize,
    },

    /// Fixed-length vector written with the wrong number of elements
    #[error("Vector length mismatch: expected {expected} elements, got {got}")]
    VectorLength { expected: usize, got: usize },

    /// Field index does not exist in the schema
    #[error("Unknown field index {index}: schema '{schema}' has {field_count} fields")]
    UnknownField {
        index: usize,
        schema: String,
        field_count: usize,
    },

    /// Structured-text conversion failed
    #[error("JSON conversion error: {0}")]
    Json(String),
}

impl CodecError {
    /// Create a Truncated error from reader state
    pub fn truncated(need: usize, offset: usize, remaining: usize, context: impl Into<String>) -> Self {
        Self::Truncated {
            need,
            offset,
            remaining,
            context: context.into(),
        }
    }

    /// Create a KindMismatch error
    pub fn kind_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an UnknownField error
    pub fn unknown_field(index: usize, schema: impl Into<String>, field_count: usize) -> Self {
        Self::UnknownField {
            index,
            schema: schema.into(),
            field_count,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;
