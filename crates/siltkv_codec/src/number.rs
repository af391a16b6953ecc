//! Fixed-width number encodings whose big-endian bytes sort like the numbers.

use crate::error::{CodecError, CodecResult};

const SIGN_MASK: u64 = 0x8000_0000_0000_0000;

/// Appends `v` with its sign bit flipped, so negatives sort first.
#[allow(clippy::cast_sign_loss)]
pub fn encode_int(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&((v as u64) ^ SIGN_MASK).to_be_bytes());
}

/// Appends `v` in descending order.
#[allow(clippy::cast_sign_loss)]
pub fn encode_int_desc(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&(!((v as u64) ^ SIGN_MASK)).to_be_bytes());
}

/// Decodes an integer written by [`encode_int`], returning the unread tail.
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
#[allow(clippy::cast_possible_wrap)]
pub fn decode_int(b: &[u8]) -> CodecResult<(&[u8], i64)> {
    let (rest, u) = read_u64(b)?;
    Ok((rest, (u ^ SIGN_MASK) as i64))
}

/// Decodes an integer written by [`encode_int_desc`].
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
#[allow(clippy::cast_possible_wrap)]
pub fn decode_int_desc(b: &[u8]) -> CodecResult<(&[u8], i64)> {
    let (rest, u) = read_u64(b)?;
    Ok((rest, (!u ^ SIGN_MASK) as i64))
}

/// Appends `v` big-endian; unsigned values are already monotonic.
pub fn encode_uint(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Appends `v` in descending order.
pub fn encode_uint_desc(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&(!v).to_be_bytes());
}

/// Decodes an unsigned integer written by [`encode_uint`].
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
pub fn decode_uint(b: &[u8]) -> CodecResult<(&[u8], u64)> {
    read_u64(b)
}

/// Decodes an unsigned integer written by [`encode_uint_desc`].
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
pub fn decode_uint_desc(b: &[u8]) -> CodecResult<(&[u8], u64)> {
    let (rest, u) = read_u64(b)?;
    Ok((rest, !u))
}

/// Appends `v` so that byte order matches float order, including infinities.
///
/// `-0.0` is written as `0.0`. Callers must reject NaN beforehand.
pub fn encode_float(buf: &mut Vec<u8>, v: f64) {
    encode_uint(buf, float_to_ordered(v));
}

/// Appends `v` in descending order.
pub fn encode_float_desc(buf: &mut Vec<u8>, v: f64) {
    encode_uint_desc(buf, float_to_ordered(v));
}

/// Decodes a float written by [`encode_float`].
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
pub fn decode_float(b: &[u8]) -> CodecResult<(&[u8], f64)> {
    let (rest, u) = decode_uint(b)?;
    Ok((rest, ordered_to_float(u)))
}

/// Decodes a float written by [`encode_float_desc`].
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if fewer than 8 bytes remain.
pub fn decode_float_desc(b: &[u8]) -> CodecResult<(&[u8], f64)> {
    let (rest, u) = decode_uint_desc(b)?;
    Ok((rest, ordered_to_float(u)))
}

fn float_to_ordered(v: f64) -> u64 {
    let bits = if v == 0.0 { 0 } else { v.to_bits() };
    if bits & SIGN_MASK == 0 {
        bits | SIGN_MASK
    } else {
        !bits
    }
}

fn ordered_to_float(u: u64) -> f64 {
    let bits = if u & SIGN_MASK == 0 { !u } else { u & !SIGN_MASK };
    f64::from_bits(bits)
}

fn read_u64(b: &[u8]) -> CodecResult<(&[u8], u64)> {
    let (head, rest) = b.split_first_chunk::<8>().ok_or(CodecError::UnexpectedEof)?;
    Ok((rest, u64::from_be_bytes(*head)))
}
