//! Binary Field Buffers for Selective Serialization
//!
//! ## Purpose
//!
//! [`BufferWriter`] appends field values to an outbound byte sink in the exact
//! order the caller asks for them; [`BufferReader`] consumes them back in the
//! same order. The wire carries no type tags: the reader must request the type
//! the writer emitted, so both sides drive the buffers from the same schema.
//!
//! ## Architecture Role
//!
//! ```text
//! AttributeRecord::encode → [BufferWriter] → socket bytes
//!                                                ↓
//! AttributeRecord::decode ← [BufferReader] ← socket bytes
//! ```
//!
//! ## Encoding Rules
//!
//! - All multi-byte integers are big-endian
//! - Strings and arrays carry a `u32` length prefix
//! - Fixed-length vectors carry no prefix; the schema supplies the length
//! - Nested values are written field by field in nested-schema order

use crate::error::{CodecError, CodecResult};
use crate::field::{FieldType, FieldValue};
use byteorder::{BigEndian, ReadBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Upper bound on decoded string/array lengths
///
/// Guards against a corrupted length prefix allocating gigabytes before the
/// truncation check can fire.
pub const MAX_COLLECTION_LEN: usize = 16 * 1024 * 1024;

/// Append-only binary sink for field values
#[derive(Debug, Default)]
pub struct BufferWriter {
    buf: BytesMut,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, yielding the encoded bytes
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Append bytes already encoded by another writer
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_int(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_double(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Length prefix for a string or array
    ///
    /// Lengths the reader would refuse are rejected here, before any byte of
    /// the collection is written.
    fn length_prefix(&self, len: usize) -> CodecResult<u32> {
        u32::try_from(len)
            .ok()
            .filter(|_| len <= MAX_COLLECTION_LEN)
            .ok_or(CodecError::CollectionTooLarge {
                len,
                limit: MAX_COLLECTION_LEN,
                offset: self.buf.len(),
            })
    }

    pub fn write_string(&mut self, value: &str) -> CodecResult<()> {
        let len = self.length_prefix(value.len())?;
        self.buf.put_u32(len);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_bool_array(&mut self, values: &[bool]) -> CodecResult<()> {
        let len = self.length_prefix(values.len())?;
        self.buf.put_u32(len);
        for v in values {
            self.write_bool(*v);
        }
        Ok(())
    }

    pub fn write_int_array(&mut self, values: &[i32]) -> CodecResult<()> {
        let len = self.length_prefix(values.len())?;
        self.buf.put_u32(len);
        for v in values {
            self.buf.put_i32(*v);
        }
        Ok(())
    }

    pub fn write_double_array(&mut self, values: &[f64]) -> CodecResult<()> {
        let len = self.length_prefix(values.len())?;
        self.buf.put_u32(len);
        for v in values {
            self.buf.put_f64(*v);
        }
        Ok(())
    }

    pub fn write_string_array(&mut self, values: &[String]) -> CodecResult<()> {
        self.check_strings(values)?;
        let len = self.length_prefix(values.len())?;
        self.buf.put_u32(len);
        for v in values {
            self.write_string(v)?;
        }
        Ok(())
    }

    fn check_strings(&self, values: &[String]) -> CodecResult<()> {
        values
            .iter()
            .try_for_each(|v| self.length_prefix(v.len()).map(drop))
    }

    /// Write `value` as the declared field type
    ///
    /// Fails without writing anything if the value does not fit the type or
    /// holds a collection too long to encode, so a rejected field never
    /// leaves a half-written slot behind.
    pub fn write_value(&mut self, ty: &FieldType, value: &FieldValue) -> CodecResult<()> {
        if !ty.accepts(value) {
            return Err(CodecError::kind_mismatch(ty.name(), value.kind_name()));
        }
        self.check_lengths(value)?;
        self.write_checked(value)
    }

    fn check_lengths(&self, value: &FieldValue) -> CodecResult<()> {
        match value {
            FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Enum(_) | FieldValue::Double(_) => {
                Ok(())
            }
            FieldValue::String(v) => self.length_prefix(v.len()).map(drop),
            FieldValue::BoolArray(v) => self.length_prefix(v.len()).map(drop),
            FieldValue::IntArray(v) => self.length_prefix(v.len()).map(drop),
            FieldValue::DoubleArray(v) => self.length_prefix(v.len()).map(drop),
            FieldValue::StringArray(v) => {
                self.length_prefix(v.len())?;
                self.check_strings(v)
            }
            FieldValue::Vector(items) | FieldValue::Nested(items) => {
                items.iter().try_for_each(|item| self.check_lengths(item))
            }
        }
    }

    fn write_checked(&mut self, value: &FieldValue) -> CodecResult<()> {
        match value {
            FieldValue::Bool(v) => self.write_bool(*v),
            FieldValue::Int(v) | FieldValue::Enum(v) => self.write_int(*v),
            FieldValue::Double(v) => self.write_double(*v),
            FieldValue::String(v) => self.write_string(v)?,
            FieldValue::BoolArray(v) => self.write_bool_array(v)?,
            FieldValue::IntArray(v) => self.write_int_array(v)?,
            FieldValue::DoubleArray(v) => self.write_double_array(v)?,
            FieldValue::StringArray(v) => self.write_string_array(v)?,
            FieldValue::Vector(items) | FieldValue::Nested(items) => {
                for item in items {
                    self.write_checked(item)?;
                }
            }
        }
        Ok(())
    }
}

/// Sequential binary source for field values
pub struct BufferReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BufferReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Current byte offset into the input
    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.offset())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, need: usize, context: &str) -> CodecResult<()> {
        if self.remaining() < need {
            return Err(CodecError::truncated(
                need,
                self.offset(),
                self.remaining(),
                context,
            ));
        }
        Ok(())
    }

    fn truncated(&self, need: usize, context: &str) -> CodecError {
        CodecError::truncated(need, self.offset(), self.remaining(), context)
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.cursor.read_u8().map_err(|_| self.truncated(1, "u8"))
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        self.cursor
            .read_u32::<BigEndian>()
            .map_err(|_| self.truncated(4, "u32"))
    }

    pub fn read_int(&mut self) -> CodecResult<i32> {
        self.cursor
            .read_i32::<BigEndian>()
            .map_err(|_| self.truncated(4, "int"))
    }

    pub fn read_double(&mut self) -> CodecResult<f64> {
        self.cursor
            .read_f64::<BigEndian>()
            .map_err(|_| self.truncated(8, "double"))
    }

    fn read_len(&mut self, element_size: usize, context: &str) -> CodecResult<usize> {
        let offset = self.offset();
        let len = self.read_u32()? as usize;
        if len > MAX_COLLECTION_LEN {
            return Err(CodecError::CollectionTooLarge {
                len,
                limit: MAX_COLLECTION_LEN,
                offset,
            });
        }
        self.ensure(len.saturating_mul(element_size), context)?;
        Ok(len)
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_len(1, "string")?;
        let start = self.offset();
        let bytes = &self.cursor.get_ref()[start..start + len];
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::InvalidUtf8 {
                offset: start,
                detail: e.to_string(),
            })?
            .to_string();
        self.cursor.set_position((start + len) as u64);
        Ok(text)
    }

    pub fn read_bool_array(&mut self) -> CodecResult<Vec<bool>> {
        let len = self.read_len(1, "bool[]")?;
        (0..len).map(|_| self.read_bool()).collect()
    }

    pub fn read_int_array(&mut self) -> CodecResult<Vec<i32>> {
        let len = self.read_len(4, "int[]")?;
        (0..len).map(|_| self.read_int()).collect()
    }

    pub fn read_double_array(&mut self) -> CodecResult<Vec<f64>> {
        let len = self.read_len(8, "double[]")?;
        (0..len).map(|_| self.read_double()).collect()
    }

    pub fn read_string_array(&mut self) -> CodecResult<Vec<String>> {
        // Minimum 4 bytes per element for the length prefix
        let len = self.read_len(4, "string[]")?;
        (0..len).map(|_| self.read_string()).collect()
    }

    /// Read the next value as the declared field type
    pub fn read_value(&mut self, ty: &FieldType) -> CodecResult<FieldValue> {
        Ok(match ty {
            FieldType::Bool => FieldValue::Bool(self.read_bool()?),
            FieldType::Int => FieldValue::Int(self.read_int()?),
            FieldType::Double => FieldValue::Double(self.read_double()?),
            FieldType::String => FieldValue::String(self.read_string()?),
            FieldType::Enum { variants } => {
                let ordinal = self.read_int()?;
                if ordinal < 0 || ordinal as usize >= variants.len() {
                    return Err(CodecError::kind_mismatch(
                        format!("enum ordinal < {}", variants.len()),
                        ordinal.to_string(),
                    ));
                }
                FieldValue::Enum(ordinal)
            }
            FieldType::BoolArray => FieldValue::BoolArray(self.read_bool_array()?),
            FieldType::IntArray => FieldValue::IntArray(self.read_int_array()?),
            FieldType::DoubleArray => FieldValue::DoubleArray(self.read_double_array()?),
            FieldType::StringArray => FieldValue::StringArray(self.read_string_array()?),
            FieldType::Vector { element, len } => {
                let element_type = element.as_field_type();
                let items = (0..*len)
                    .map(|_| self.read_value(&element_type))
                    .collect::<CodecResult<Vec<_>>>()?;
                FieldValue::Vector(items)
            }
            FieldType::Nested(fields) => {
                let items = fields
                    .iter()
                    .map(|field| self.read_value(field))
                    .collect::<CodecResult<Vec<_>>>()?;
                FieldValue::Nested(items)
            }
        })
    }
}
