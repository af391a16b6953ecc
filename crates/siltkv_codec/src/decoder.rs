//! Tuple decoder.

use crate::bytes::{decode_bytes, decode_bytes_desc};
use crate::encoder::{BYTES_FLAG, FLOAT_FLAG, INT_FLAG, NIL_FLAG, UINT_FLAG};
use crate::error::{CodecError, CodecResult};
use crate::number::{
    decode_float, decode_float_desc, decode_int, decode_int_desc, decode_uint, decode_uint_desc,
};
use crate::value::Value;

/// Decodes every value in an ascending composite key.
///
/// # Errors
///
/// Returns an error on an unknown flag or truncated/malformed field.
pub fn decode_key(bytes: &[u8]) -> CodecResult<Vec<Value>> {
    let mut decoder = KeyDecoder::new(bytes);
    let mut values = Vec::new();
    while !decoder.is_empty() {
        values.push(decoder.next_value()?);
    }
    Ok(values)
}

/// Decodes exactly one ascending value.
///
/// # Errors
///
/// Returns [`CodecError::TrailingBytes`] if input remains after the value,
/// or any error [`decode_key`] can return.
pub fn decode_value(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = KeyDecoder::new(bytes);
    let value = decoder.next_value()?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes exactly one descending value.
///
/// # Errors
///
/// Same as [`decode_value`].
pub fn decode_value_desc(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = KeyDecoder::new(bytes);
    let value = decoder.next_value_desc()?;
    decoder.finish()?;
    Ok(value)
}

/// Reads values off the front of a composite key.
#[derive(Debug, Clone)]
pub struct KeyDecoder<'a> {
    data: &'a [u8],
}

impl<'a> KeyDecoder<'a> {
    /// Create a new decoder for the given bytes.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if all bytes have been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get remaining bytes.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    /// Decodes the next ascending field.
    ///
    /// # Errors
    ///
    /// Returns an error on an unknown flag or truncated/malformed field;
    /// the decoder does not advance in that case.
    pub fn next_value(&mut self) -> CodecResult<Value> {
        let (rest, value) = decode_one(self.data, false)?;
        self.data = rest;
        Ok(value)
    }

    /// Decodes the next descending field.
    ///
    /// # Errors
    ///
    /// Same as [`KeyDecoder::next_value`].
    pub fn next_value_desc(&mut self) -> CodecResult<Value> {
        let (rest, value) = decode_one(self.data, true)?;
        self.data = rest;
        Ok(value)
    }

    /// Fails if any bytes remain.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TrailingBytes`] with the unread count.
    pub fn finish(self) -> CodecResult<()> {
        if self.data.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                count: self.data.len(),
            })
        }
    }
}

fn decode_one(b: &[u8], desc: bool) -> CodecResult<(&[u8], Value)> {
    let (&raw, rest) = b.split_first().ok_or(CodecError::UnexpectedEof)?;
    let flag = if desc { !raw } else { raw };
    match flag {
        NIL_FLAG => Ok((rest, Value::Null)),
        INT_FLAG => {
            let (rest, n) = if desc {
                decode_int_desc(rest)?
            } else {
                decode_int(rest)?
            };
            Ok((rest, Value::Int(n)))
        }
        UINT_FLAG => {
            let (rest, n) = if desc {
                decode_uint_desc(rest)?
            } else {
                decode_uint(rest)?
            };
            Ok((rest, Value::Uint(n)))
        }
        FLOAT_FLAG => {
            let (rest, f) = if desc {
                decode_float_desc(rest)?
            } else {
                decode_float(rest)?
            };
            Ok((rest, Value::Float(f)))
        }
        BYTES_FLAG => {
            let (rest, data) = if desc {
                decode_bytes_desc(rest)?
            } else {
                decode_bytes(rest)?
            };
            Ok((rest, Value::Bytes(data)))
        }
        other => Err(CodecError::UnknownFlag { flag: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_key, encode_value, encode_value_desc, KeyEncoder};

    #[test]
    fn decode_mixed_directions() {
        let mut encoder = KeyEncoder::new();
        encoder
            .push(&Value::from("idx"))
            .unwrap()
            .push_desc(&Value::Int(-5))
            .unwrap()
            .push(&Value::Uint(9))
            .unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = KeyDecoder::new(&bytes);
        assert_eq!(decoder.next_value().unwrap(), Value::from("idx"));
        assert_eq!(decoder.next_value_desc().unwrap(), Value::Int(-5));
        assert_eq!(decoder.next_value().unwrap(), Value::Uint(9));
        decoder.finish().unwrap();
    }

    #[test]
    fn single_value_rejects_trailing_bytes() {
        let bytes = encode_key(&[Value::Int(1), Value::Null]).unwrap();
        assert_eq!(
            decode_value(&bytes),
            Err(CodecError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn desc_single_value() {
        let v = Value::from("hello world");
        assert_eq!(decode_value_desc(&encode_value_desc(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn malformed_input() {
        assert_eq!(decode_value(&[]), Err(CodecError::UnexpectedEof));
        assert_eq!(
            decode_key(&[0x7e]),
            Err(CodecError::UnknownFlag { flag: 0x7e })
        );
        let mut truncated = encode_value(&Value::Uint(7)).unwrap();
        truncated.pop();
        assert_eq!(decode_key(&truncated), Err(CodecError::UnexpectedEof));
        assert!(decode_key(&truncated).unwrap_err().is_decode_error());
    }

    #[test]
    fn failed_decode_does_not_advance() {
        let mut decoder = KeyDecoder::new(&[INT_FLAG, 0x80]);
        assert!(decoder.next_value().is_err());
        assert_eq!(decoder.remaining(), &[INT_FLAG, 0x80]);
    }
}
