//! Tuple encoder.

use crate::bytes::{complement, encode_bytes};
use crate::error::{CodecError, CodecResult};
use crate::number::{encode_float, encode_int, encode_uint};
use crate::value::Value;

pub(crate) const NIL_FLAG: u8 = 0x00;
pub(crate) const INT_FLAG: u8 = 0x01;
pub(crate) const UINT_FLAG: u8 = 0x02;
pub(crate) const FLOAT_FLAG: u8 = 0x03;
pub(crate) const BYTES_FLAG: u8 = 0x04;

/// Encodes a tuple of values into one byte-comparable key.
///
/// # Errors
///
/// Returns [`CodecError::NaNForbidden`] if any value is a NaN float.
pub fn encode_key(values: &[Value]) -> CodecResult<Vec<u8>> {
    let mut encoder = KeyEncoder::new();
    for value in values {
        encoder.push(value)?;
    }
    Ok(encoder.into_bytes())
}

/// Encodes a single value.
///
/// # Errors
///
/// Returns [`CodecError::NaNForbidden`] for a NaN float.
pub fn encode_value(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = KeyEncoder::new();
    encoder.push(value)?;
    Ok(encoder.into_bytes())
}

/// Encodes a single value in descending order.
///
/// # Errors
///
/// Returns [`CodecError::NaNForbidden`] for a NaN float.
pub fn encode_value_desc(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = KeyEncoder::new();
    encoder.push_desc(value)?;
    Ok(encoder.into_bytes())
}

/// Builds a composite key one field at a time.
///
/// Ascending and descending fields can be mixed; each field is
/// self-delimiting so the result decodes unambiguously with
/// [`crate::KeyDecoder`] given the same directions.
#[derive(Debug, Default, Clone)]
pub struct KeyEncoder {
    buffer: Vec<u8>,
}

impl KeyEncoder {
    /// Create a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new encoder with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Appends `value` in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NaNForbidden`] for a NaN float; the buffer is
    /// left unchanged.
    pub fn push(&mut self, value: &Value) -> CodecResult<&mut Self> {
        encode_into(&mut self.buffer, value)?;
        Ok(self)
    }

    /// Appends `value` in descending order.
    ///
    /// # Errors
    ///
    /// Same as [`KeyEncoder::push`].
    pub fn push_desc(&mut self, value: &Value) -> CodecResult<&mut Self> {
        let start = self.buffer.len();
        encode_into(&mut self.buffer, value)?;
        complement(&mut self.buffer[start..]);
        Ok(self)
    }

    /// Consume this encoder and return the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

fn encode_into(buf: &mut Vec<u8>, value: &Value) -> CodecResult<()> {
    match value {
        Value::Null => buf.push(NIL_FLAG),
        Value::Int(n) => {
            buf.push(INT_FLAG);
            encode_int(buf, *n);
        }
        Value::Uint(n) => {
            buf.push(UINT_FLAG);
            encode_uint(buf, *n);
        }
        Value::Float(f) => {
            if f.is_nan() {
                return Err(CodecError::NaNForbidden);
            }
            buf.push(FLOAT_FLAG);
            encode_float(buf, *f);
        }
        Value::Bytes(b) => {
            buf.push(BYTES_FLAG);
            encode_bytes(buf, b);
        }
    }
    Ok(())
}
