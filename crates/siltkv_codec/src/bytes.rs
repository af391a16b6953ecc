//! Group encoding for byte strings.
//!
//! Input is cut into 8-byte groups. Each group is written in full followed
//! by a marker byte: `0xFF` for a full group, `0xFF - pad` for the final,
//! zero-padded group. An input whose length is a multiple of 8 ends with an
//! all-padding group, so every encoding terminates in a marker below `0xFF`
//! and no encoding is a prefix of another.
//!
//! ```text
//! "abc"      -> 61 62 63 00 00 00 00 00 | FA
//! "abcdefgh" -> 61 62 63 64 65 66 67 68 | FF  00 00 00 00 00 00 00 00 | F7
//! ```

use crate::error::{CodecError, CodecResult};

const GROUP_SIZE: usize = 8;
const ENCODED_GROUP_SIZE: usize = GROUP_SIZE + 1;
const MARKER: u8 = 0xFF;
const PAD: u8 = 0x00;

/// Appends the group encoding of `data`.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.reserve((data.len() / GROUP_SIZE + 1) * ENCODED_GROUP_SIZE);
    let mut groups = data.chunks_exact(GROUP_SIZE);
    for group in &mut groups {
        buf.extend_from_slice(group);
        buf.push(MARKER);
    }
    let tail = groups.remainder();
    let pad = GROUP_SIZE - tail.len();
    buf.extend_from_slice(tail);
    buf.resize(buf.len() + pad, PAD);
    buf.push(MARKER - pad as u8);
}

/// Appends the group encoding of `data` with every byte complemented.
pub fn encode_bytes_desc(buf: &mut Vec<u8>, data: &[u8]) {
    let start = buf.len();
    encode_bytes(buf, data);
    complement(&mut buf[start..]);
}

/// Decodes bytes written by [`encode_bytes`], returning the unread tail.
///
/// # Errors
///
/// Returns an error if the input ends mid-group, a marker is out of range,
/// or padding bytes are not zero.
pub fn decode_bytes(b: &[u8]) -> CodecResult<(&[u8], Vec<u8>)> {
    decode_groups(b, false)
}

/// Decodes bytes written by [`encode_bytes_desc`].
///
/// # Errors
///
/// Same as [`decode_bytes`].
pub fn decode_bytes_desc(b: &[u8]) -> CodecResult<(&[u8], Vec<u8>)> {
    decode_groups(b, true)
}

pub(crate) fn complement(bytes: &mut [u8]) {
    for byte in bytes {
        *byte = !*byte;
    }
}

fn decode_groups(mut b: &[u8], desc: bool) -> CodecResult<(&[u8], Vec<u8>)> {
    let mut out = Vec::with_capacity(b.len() / ENCODED_GROUP_SIZE * GROUP_SIZE);
    loop {
        let (raw, rest) = b
            .split_first_chunk::<ENCODED_GROUP_SIZE>()
            .ok_or(CodecError::UnexpectedEof)?;
        b = rest;

        let mut group = *raw;
        if desc {
            complement(&mut group);
        }

        let marker = group[GROUP_SIZE];
        let pad = usize::from(MARKER - marker);
        if pad > GROUP_SIZE {
            return Err(CodecError::invalid_structure(format!(
                "invalid bytes group marker {marker:#04x}"
            )));
        }

        let len = GROUP_SIZE - pad;
        out.extend_from_slice(&group[..len]);
        if pad != 0 {
            if group[len..GROUP_SIZE].iter().any(|&p| p != PAD) {
                return Err(CodecError::invalid_structure(
                    "non-zero padding in final bytes group",
                ));
            }
            return Ok((b, out));
        }
    }
}
