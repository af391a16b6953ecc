//! Scalar values accepted by the key codec.

use crate::error::{CodecError, CodecResult};
use std::cmp::Ordering;
use std::fmt;

/// A scalar that can be placed in an order-preserving key.
///
/// The set of kinds is closed. Values of different kinds order by kind:
///
/// `Null < Int < Uint < Float < Bytes`
///
/// Within a kind, values order naturally (bytes lexicographically).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL-style null, lower than every other value.
    Null,
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    Uint(u64),
    /// 64-bit float. NaN is rejected at encode time.
    Float(f64),
    /// Arbitrary bytes (strings are stored as their UTF-8 bytes).
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this is `Value::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer if this is `Value::Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the unsigned integer if this is `Value::Uint`.
    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float if this is `Value::Float`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the bytes if this is `Value::Bytes`.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Position of this value's kind in the cross-kind order.
    #[must_use]
    pub fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) => 1,
            Self::Uint(_) => 2,
            Self::Float(_) => 3,
            Self::Bytes(_) => 4,
        }
    }

    /// Semantic comparison matching the byte order of encoded values.
    ///
    /// Floats compare with `total_cmp` after folding `-0.0` into `0.0`,
    /// which is exactly what the encoder does.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => fold_zero(*a).total_cmp(&fold_zero(*b)),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    /// Parses a typed literal such as `i:-3`, `u:7`, `f:1.5`, `s:abc`,
    /// `x:00ff` (hex bytes) or `null`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the type prefix is not one of
    /// the supported kinds or the payload does not parse.
    pub fn from_literal(literal: &str) -> CodecResult<Self> {
        if literal == "null" {
            return Ok(Self::Null);
        }
        let (kind, body) = literal.split_once(':').ok_or_else(|| {
            CodecError::encoding_failed(format!("literal {literal:?} has no type prefix"))
        })?;
        let bad = |e: &dyn fmt::Display| {
            CodecError::encoding_failed(format!("invalid {kind} literal {body:?}: {e}"))
        };
        match kind {
            "i" => body.parse().map(Self::Int).map_err(|e| bad(&e)),
            "u" => body.parse().map(Self::Uint).map_err(|e| bad(&e)),
            "f" => body.parse().map(Self::Float).map_err(|e| bad(&e)),
            "s" => Ok(Self::Bytes(body.as_bytes().to_vec())),
            "x" => decode_hex(body).map(Self::Bytes).ok_or_else(|| bad(&"odd length or non-hex digit")),
            other => Err(CodecError::encoding_failed(format!(
                "unsupported value type {other:?}"
            ))),
        }
    }
}

fn fold_zero(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n) => write!(f, "i:{n}"),
            Self::Uint(n) => write!(f, "u:{n}"),
            Self::Float(v) => write!(f, "f:{v}"),
            Self::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "s:{s}"),
                Err(_) => {
                    write!(f, "x:")?;
                    b.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
                }
            },
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Uint(u64::from(v))
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, bool);
from_unsigned!(u8, u16, u32, u64);

impl From<isize> for Value {
    #[allow(clippy::cast_possible_truncation)]
    fn from(v: isize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Bytes(v.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_expected_kind() {
        assert_eq!(Value::from(true), Value::Int(1));
        assert_eq!(Value::from(false), Value::Int(0));
        assert_eq!(Value::from(7i8), Value::Int(7));
        assert_eq!(Value::from(7u16), Value::Uint(7));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert_eq!(Value::from("123"), Value::Bytes(b"123".to_vec()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3u64)), Value::Uint(3));
    }

    #[test]
    fn cross_kind_order() {
        let ordered = [
            Value::Null,
            Value::Int(i64::MAX),
            Value::Uint(0),
            Value::Float(f64::MIN),
            Value::Bytes(vec![]),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn negative_zero_equals_zero() {
        assert_eq!(
            Value::Float(-0.0).compare(&Value::Float(0.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn parse_literals() {
        assert_eq!(Value::from_literal("null").unwrap(), Value::Null);
        assert_eq!(Value::from_literal("i:-3").unwrap(), Value::Int(-3));
        assert_eq!(Value::from_literal("u:7").unwrap(), Value::Uint(7));
        assert_eq!(Value::from_literal("f:1.5").unwrap(), Value::Float(1.5));
        assert_eq!(
            Value::from_literal("s:a:b").unwrap(),
            Value::Bytes(b"a:b".to_vec())
        );
        assert_eq!(
            Value::from_literal("x:00ff").unwrap(),
            Value::Bytes(vec![0x00, 0xff])
        );
    }

    #[test]
    fn unsupported_literal_is_encode_error() {
        let err = Value::from_literal("d:2024-01-01").unwrap_err();
        assert!(err.is_encode_error());
        assert!(Value::from_literal("i:abc").unwrap_err().is_encode_error());
        assert!(Value::from_literal("x:abc").is_err());
        assert!(Value::from_literal("plain").is_err());
    }

    #[test]
    fn display_round_trips_through_literal() {
        for v in [
            Value::Null,
            Value::Int(-9),
            Value::Uint(9),
            Value::Float(2.25),
            Value::from("key"),
            Value::Bytes(vec![0xff, 0x00]),
        ] {
            assert_eq!(Value::from_literal(&v.to_string()).unwrap(), v);
        }
    }
}
