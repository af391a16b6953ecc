//! # siltkv Codec
//!
//! Order-preserving encoding of scalar tuples into byte strings.
//!
//! Comparing two encoded keys with plain unsigned byte comparison gives the
//! same answer as comparing the source tuples field by field. This is what
//! lets an ordered byte store answer range scans over composite keys.
//!
//! ## Format
//!
//! Every field is a flag byte followed by a kind-specific body:
//!
//! | kind  | flag | body |
//! |-------|------|------|
//! | Null  | 0x00 | none |
//! | Int   | 0x01 | 8 bytes big-endian, sign bit flipped |
//! | Uint  | 0x02 | 8 bytes big-endian |
//! | Float | 0x03 | 8 bytes, IEEE-754 bits made monotonic |
//! | Bytes | 0x04 | 8-byte groups, each followed by a marker byte |
//!
//! A descending field is the ascending encoding with every byte
//! complemented. The layout is the on-disk format and must stay stable.
//!
//! ## Usage
//!
//! ```
//! use siltkv_codec::{decode_key, encode_key, Value};
//!
//! let key = encode_key(&[Value::from("users"), Value::Int(42)]).unwrap();
//! assert_eq!(
//!     decode_key(&key).unwrap(),
//!     vec![Value::from("users"), Value::Int(42)]
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bytes;
mod decoder;
mod encoder;
mod error;
mod number;
mod value;

pub use bytes::{decode_bytes, decode_bytes_desc, encode_bytes, encode_bytes_desc};
pub use decoder::{decode_key, decode_value, decode_value_desc, KeyDecoder};
pub use encoder::{encode_key, encode_value, encode_value_desc, KeyEncoder};
pub use error::{CodecError, CodecResult};
pub use number::{
    decode_float, decode_float_desc, decode_int, decode_int_desc, decode_uint, decode_uint_desc,
    encode_float, encode_float_desc, encode_int, encode_int_desc, encode_uint, encode_uint_desc,
};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn key(values: Vec<Value>) -> Vec<u8> {
        encode_key(&values).unwrap()
    }

    #[test]
    fn tuple_round_trip_normalises_input_kinds() {
        let table: Vec<(Vec<Value>, Vec<Value>)> = vec![
            (vec![1i64.into()], vec![Value::Int(1)]),
            (
                vec![1f32.into(), 3.15f64.into(), b"123".as_slice().into(), "123".into()],
                vec![
                    Value::Float(1.0),
                    Value::Float(3.15),
                    Value::from("123"),
                    Value::from("123"),
                ],
            ),
            (
                vec![1u64.into(), 3.15.into(), "123".into(), (-1i64).into()],
                vec![
                    Value::Uint(1),
                    Value::Float(3.15),
                    Value::from("123"),
                    Value::Int(-1),
                ],
            ),
            (vec![true.into(), false.into()], vec![Value::Int(1), Value::Int(0)]),
            (
                vec![1i8.into(), 1i16.into(), 1i32.into(), 1i64.into(), 1isize.into()],
                vec![Value::Int(1); 5],
            ),
            (
                vec![1u8.into(), 1u16.into(), 1u32.into(), 1u64.into(), 1usize.into()],
                vec![Value::Uint(1); 5],
            ),
            (vec![Value::Null], vec![Value::Null]),
        ];

        for (input, expected) in table {
            assert_eq!(decode_key(&key(input)).unwrap(), expected);
        }
    }

    #[test]
    fn tuple_byte_order_matches_value_order() {
        let table: Vec<(Vec<Value>, Vec<Value>, Ordering)> = vec![
            (vec![1.into()], vec![1.into()], Ordering::Equal),
            (vec![(-1).into()], vec![1.into()], Ordering::Less),
            (vec![3.15.into()], vec![3.12.into()], Ordering::Greater),
            (vec!["abc".into()], vec!["abcd".into()], Ordering::Less),
            (
                vec![1.into(), "abc".into()],
                vec![1.into(), "abcd".into()],
                Ordering::Less,
            ),
            (
                vec![1.into(), "abc".into(), "def".into()],
                vec![1.into(), "abcd".into(), "af".into()],
                Ordering::Less,
            ),
            (
                vec![3.12.into(), "ebc".into(), "def".into()],
                vec![2.12.into(), "abcd".into(), "af".into()],
                Ordering::Greater,
            ),
            (
                vec![vec![0x01u8, 0x00].into(), vec![0xFFu8].into()],
                vec![vec![0x01u8, 0x00, 0xFF].into()],
                Ordering::Less,
            ),
            (
                vec![vec![0x01u8].into(), 0x0FFF_FFFF_FFFF_FFFFi64.into()],
                vec![vec![0x01u8, 0x10].into(), 0.into()],
                Ordering::Less,
            ),
            (vec![0.into()], vec![Value::Null], Ordering::Greater),
            (vec![vec![0x00u8].into()], vec![Value::Null], Ordering::Greater),
            (
                vec![f64::from_bits(1).into()],
                vec![Value::Null],
                Ordering::Greater,
            ),
            (vec![i64::MIN.into()], vec![Value::Null], Ordering::Greater),
            (vec![f64::MIN.into()], vec![Value::Null], Ordering::Greater),
            (
                vec![1.into(), i64::MIN.into(), Value::Null],
                vec![1.into(), Value::Null, u64::MAX.into()],
                Ordering::Greater,
            ),
            (
                vec![1.into(), Vec::<u8>::new().into(), Value::Null],
                vec![1.into(), Value::Null, 123.into()],
                Ordering::Greater,
            ),
        ];

        for (left, right, expected) in table {
            assert_eq!(
                key(left.clone()).cmp(&key(right.clone())),
                expected,
                "{left:?} vs {right:?}"
            );
        }
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Int),
            any::<u64>().prop_map(Value::Uint),
            any::<f64>()
                .prop_filter("NaN has no order", |f| !f.is_nan())
                .prop_map(|f| Value::Float(if f == 0.0 { 0.0 } else { f })),
            prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
        ]
    }

    fn same_value(a: &Value, b: &Value) -> bool {
        a.compare(b) == Ordering::Equal
    }

    proptest! {
        #[test]
        fn single_value_round_trip(v in value_strategy()) {
            prop_assert_eq!(decode_value(&encode_value(&v).unwrap()).unwrap(), v.clone());
            prop_assert_eq!(decode_value_desc(&encode_value_desc(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn byte_order_is_semantic_order(a in value_strategy(), b in value_strategy()) {
            let asc = encode_value(&a).unwrap().cmp(&encode_value(&b).unwrap());
            let desc = encode_value_desc(&a).unwrap().cmp(&encode_value_desc(&b).unwrap());
            prop_assert_eq!(asc, a.compare(&b));
            prop_assert_eq!(desc, asc.reverse());
        }

        #[test]
        fn distinct_values_are_prefix_free(a in value_strategy(), b in value_strategy()) {
            prop_assume!(!same_value(&a, &b));
            let ea = encode_value(&a).unwrap();
            let eb = encode_value(&b).unwrap();
            prop_assert!(!ea.starts_with(&eb));
            prop_assert!(!eb.starts_with(&ea));
        }

        #[test]
        fn pair_round_trip(a in value_strategy(), b in value_strategy()) {
            let bytes = encode_key(&[a.clone(), b.clone()]).unwrap();
            prop_assert_eq!(decode_key(&bytes).unwrap(), vec![a, b]);
        }

        #[test]
        fn pair_order_is_lexicographic(
            a in (value_strategy(), value_strategy()),
            b in (value_strategy(), value_strategy()),
        ) {
            let expected = a.0.compare(&b.0).then_with(|| a.1.compare(&b.1));
            let ka = encode_key(&[a.0, a.1]).unwrap();
            let kb = encode_key(&[b.0, b.1]).unwrap();
            prop_assert_eq!(ka.cmp(&kb), expected);
        }
    }
}
