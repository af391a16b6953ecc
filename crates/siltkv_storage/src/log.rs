//! Batch log format used by [`crate::FileEngine`].
//!
//! ```text
//! file   := magic (6) | version u16 | record*
//! record := len u32 | crc32 u32 | payload (len)
//! payload:= count u32 | op*
//! op     := kind u8 | klen u32 | key | [vlen u32 | value]   (value only for puts)
//! ```
//!
//! All integers are little-endian. The checksum covers the payload. A
//! record cut short at the end of the file is a torn write and marks the
//! end of the log; a complete record with a bad checksum is corruption, and
//! so is a length that runs past the end while intact records follow it.

use crate::batch::{BatchOp, WriteBatch};
use crate::error::{StorageError, StorageResult};

/// Magic bytes at the start of every log file.
pub const LOG_MAGIC: &[u8; 6] = b"SILTKV";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// Size of the file header.
pub const FILE_HEADER_SIZE: usize = LOG_MAGIC.len() + 2;

const RECORD_HEADER_SIZE: usize = 8;
const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;

/// Returns the file header bytes.
#[must_use]
pub fn file_header() -> [u8; FILE_HEADER_SIZE] {
    let mut header = [0u8; FILE_HEADER_SIZE];
    header[..LOG_MAGIC.len()].copy_from_slice(LOG_MAGIC);
    header[LOG_MAGIC.len()..].copy_from_slice(&LOG_VERSION.to_le_bytes());
    header
}

fn len_u32(len: usize) -> StorageResult<u32> {
    u32::try_from(len).map_err(|_| StorageError::RecordTooLarge { len })
}

/// Frames `batch` as one log record.
///
/// # Errors
///
/// Returns [`StorageError::RecordTooLarge`] if any length overflows 32 bits.
pub fn encode_record(batch: &WriteBatch) -> StorageResult<Vec<u8>> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&len_u32(batch.len())?.to_le_bytes());
    for op in batch.iter() {
        match op {
            BatchOp::Put { key, value } => {
                payload.push(OP_PUT);
                payload.extend_from_slice(&len_u32(key.len())?.to_le_bytes());
                payload.extend_from_slice(key);
                payload.extend_from_slice(&len_u32(value.len())?.to_le_bytes());
                payload.extend_from_slice(value);
            }
            BatchOp::Delete { key } => {
                payload.push(OP_DELETE);
                payload.extend_from_slice(&len_u32(key.len())?.to_le_bytes());
                payload.extend_from_slice(key);
            }
        }
    }

    let mut record = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
    record.extend_from_slice(&len_u32(payload.len())?.to_le_bytes());
    record.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Result of scanning a log image.
#[derive(Debug, Default)]
pub struct Replay {
    /// Complete batches in log order.
    pub batches: Vec<WriteBatch>,
    /// Length of the intact prefix, header included.
    pub valid_len: u64,
    /// Bytes past `valid_len` that belong to a torn record.
    pub torn_bytes: u64,
}

/// Validates the file header.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] for a bad magic or a newer version.
pub fn check_header(data: &[u8]) -> StorageResult<()> {
    let header = data
        .get(..FILE_HEADER_SIZE)
        .ok_or_else(|| StorageError::corrupted("log shorter than its header"))?;
    if &header[..LOG_MAGIC.len()] != LOG_MAGIC {
        return Err(StorageError::corrupted("invalid log magic"));
    }
    let version = u16::from_le_bytes([header[LOG_MAGIC.len()], header[LOG_MAGIC.len() + 1]]);
    if version > LOG_VERSION {
        return Err(StorageError::corrupted(format!(
            "unsupported log version {version}"
        )));
    }
    Ok(())
}

/// Scans a complete log image.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] if the header is invalid, a record
/// fails its checksum, or a payload is malformed.
pub fn replay(data: &[u8]) -> StorageResult<Replay> {
    check_header(data)?;
    let mut pos = FILE_HEADER_SIZE;
    let mut batches = Vec::new();

    while pos < data.len() {
        let Some(header) = data.get(pos..pos + RECORD_HEADER_SIZE) else {
            break;
        };
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let stored_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let start = pos + RECORD_HEADER_SIZE;
        let Some(payload) = data.get(start..start + len) else {
            if let Some(next) = next_record(data, start) {
                return Err(StorageError::corrupted(format!(
                    "record at offset {pos} claims {len} bytes past the end of the log, \
                     but a valid record follows at offset {next}"
                )));
            }
            break;
        };
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            return Err(StorageError::corrupted(format!(
                "checksum mismatch at offset {pos}: expected {stored_crc:#010x}, got {computed_crc:#010x}"
            )));
        }
        batches.push(decode_payload(payload, pos)?);
        pos = start + len;
    }

    Ok(Replay {
        batches,
        valid_len: pos as u64,
        torn_bytes: (data.len() - pos) as u64,
    })
}

/// Finds the first offset at or after `from` holding a complete record that
/// passes its checksum and decodes.
fn next_record(data: &[u8], from: usize) -> Option<usize> {
    (from..data.len().saturating_sub(RECORD_HEADER_SIZE)).find(|&pos| {
        let header = &data[pos..pos + RECORD_HEADER_SIZE];
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let stored_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let start = pos + RECORD_HEADER_SIZE;
        data.get(start..start + len).is_some_and(|payload| {
            crc32fast::hash(payload) == stored_crc && decode_payload(payload, pos).is_ok()
        })
    })
}

struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> StorageResult<&'a [u8]> {
        if self.data.len() < n {
            return Err(StorageError::corrupted(format!(
                "record at offset {} ends early",
                self.offset
            )));
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }

    fn u8(&mut self) -> StorageResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> StorageResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn chunk(&mut self) -> StorageResult<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }
}

fn decode_payload(payload: &[u8], offset: usize) -> StorageResult<WriteBatch> {
    let mut cursor = Cursor {
        data: payload,
        offset,
    };
    let count = cursor.u32()?;
    let mut batch = WriteBatch::new();
    for _ in 0..count {
        match cursor.u8()? {
            OP_PUT => {
                let key = cursor.chunk()?;
                let value = cursor.chunk()?;
                batch.put(key, value);
            }
            OP_DELETE => batch.delete(cursor.chunk()?),
            kind => {
                return Err(StorageError::corrupted(format!(
                    "unknown op kind {kind} in record at offset {offset}"
                )))
            }
        }
    }
    if !cursor.data.is_empty() {
        return Err(StorageError::corrupted(format!(
            "{} trailing bytes in record at offset {offset}",
            cursor.data.len()
        )));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(batches: &[WriteBatch]) -> Vec<u8> {
        let mut data = file_header().to_vec();
        for b in batches {
            data.extend(encode_record(b).unwrap());
        }
        data
    }

    fn sample() -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.put(b"alpha".to_vec(), b"1".to_vec());
        batch.delete(b"beta".to_vec());
        batch
    }

    #[test]
    fn replay_reads_every_batch() {
        let data = image(&[sample(), sample()]);
        let replay = replay(&data).unwrap();
        assert_eq!(replay.batches, vec![sample(), sample()]);
        assert_eq!(replay.valid_len, data.len() as u64);
        assert_eq!(replay.torn_bytes, 0);
    }

    #[test]
    fn torn_tail_ends_the_log() {
        let full = image(&[sample(), sample()]);
        let one = image(&[sample()]).len();
        for cut in one + 1..full.len() {
            let replay = replay(&full[..cut]).unwrap();
            assert_eq!(replay.batches.len(), 1, "cut at {cut}");
            assert_eq!(replay.valid_len, one as u64);
            assert_eq!(replay.torn_bytes, (cut - one) as u64);
        }
    }

    #[test]
    fn flipped_payload_byte_is_corruption() {
        let mut data = image(&[sample()]);
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        assert!(matches!(replay(&data), Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn overrun_length_before_intact_records_is_corruption() {
        let mut data = image(&[sample(), sample(), sample()]);
        data[FILE_HEADER_SIZE..FILE_HEADER_SIZE + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(replay(&data), Err(StorageError::Corrupted(_))));

        let one = image(&[sample()]).len();
        let mut data = image(&[sample(), sample(), sample()]);
        data[one..one + 4].copy_from_slice(&0x0100_0000u32.to_le_bytes());
        assert!(matches!(replay(&data), Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn overrun_length_on_last_record_is_torn() {
        let one = image(&[sample()]).len();
        let mut data = image(&[sample(), sample()]);
        data[one..one + 4].copy_from_slice(&0x0100_0000u32.to_le_bytes());
        let replay = replay(&data).unwrap();
        assert_eq!(replay.batches.len(), 1);
        assert_eq!(replay.valid_len, one as u64);
    }

    #[test]
    fn bad_header_rejected() {
        assert!(replay(b"SILT").is_err());
        assert!(replay(b"NOTSILT\x01\x00").is_err());
        let mut data = file_header().to_vec();
        data[LOG_MAGIC.len()] = 9;
        assert!(replay(&data).is_err());
    }

    #[test]
    fn empty_log_has_no_batches() {
        let replay = replay(&file_header()).unwrap();
        assert!(replay.batches.is_empty());
        assert_eq!(replay.valid_len, FILE_HEADER_SIZE as u64);
    }
}
