//! Commit log framing
//!
//! File layout:
//!
//! ```text
//! +----------------+  file header, written once
//! | magic [u8; 6]  |  b"SSTLOG"
//! | version u16 LE |  LOG_FORMAT_VERSION
//! +----------------+
//! | len u32 LE     |  one frame per committed value
//! | crc32 u32 LE   |  crc32 of payload
//! | payload        |  rmp-serde encoded WalRecord
//! +----------------+
//! ```

use crate::wal::WalRecord;
use byteorder::{ByteOrder, LittleEndian};
use streamstate_core::StoreError;

/// Magic bytes at the start of every commit log
pub const LOG_MAGIC: &[u8; 6] = b"SSTLOG";

/// Current on-disk format version
pub const LOG_FORMAT_VERSION: u16 = 1;

/// Size of the file header in bytes
pub const LOG_HEADER_SIZE: usize = 8;

/// Size of a frame header (length + crc) in bytes
pub const FRAME_HEADER_SIZE: usize = 8;

/// Encode the file header
pub fn encode_header() -> [u8; LOG_HEADER_SIZE] {
    let mut header = [0u8; LOG_HEADER_SIZE];
    header[..6].copy_from_slice(LOG_MAGIC);
    LittleEndian::write_u16(&mut header[6..], LOG_FORMAT_VERSION);
    header
}

/// Validate the file header
pub fn check_header(bytes: &[u8]) -> Result<(), StoreError> {
    if bytes.len() < LOG_HEADER_SIZE {
        return Err(StoreError::Corruption(format!(
            "log header truncated: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[..6] != LOG_MAGIC {
        return Err(StoreError::Corruption("bad log magic".to_string()));
    }
    let version = LittleEndian::read_u16(&bytes[6..LOG_HEADER_SIZE]);
    if version != LOG_FORMAT_VERSION {
        return Err(StoreError::Corruption(format!(
            "unsupported log version {} (expected {})",
            version, LOG_FORMAT_VERSION
        )));
    }
    Ok(())
}

/// Encode a record into a complete frame
pub fn encode_record(record: &WalRecord) -> Result<Vec<u8>, StoreError> {
    let payload = rmp_serde::to_vec_named(record)
        .map_err(|e| StoreError::Corruption(format!("record encode failed: {}", e)))?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Corruption(format!("record too large: {} bytes", payload.len()))
    })?;

    let mut frame = vec![0u8; FRAME_HEADER_SIZE + payload.len()];
    LittleEndian::write_u32(&mut frame[0..4], len);
    LittleEndian::write_u32(&mut frame[4..8], crc32fast::hash(&payload));
    frame[FRAME_HEADER_SIZE..].copy_from_slice(&payload);
    Ok(frame)
}

/// Outcome of decoding one frame from a buffer
#[derive(Debug)]
pub enum Decoded {
    /// A valid record and the total frame size
    Record(WalRecord, usize),
    /// Frame is complete but its checksum or payload is bad; skip `usize` bytes
    Corrupt(String, usize),
    /// Buffer ends before the frame does (torn write)
    Incomplete {
        /// Bytes available
        have: usize,
        /// Bytes the frame needs
        needed: usize,
    },
}

/// Decode the frame at the start of `buf`
pub fn decode_record(buf: &[u8]) -> Decoded {
    if buf.len() < FRAME_HEADER_SIZE {
        return Decoded::Incomplete {
            have: buf.len(),
            needed: FRAME_HEADER_SIZE,
        };
    }
    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    let expected_crc = LittleEndian::read_u32(&buf[4..8]);
    let total = FRAME_HEADER_SIZE + len;
    if buf.len() < total {
        return Decoded::Incomplete {
            have: buf.len(),
            needed: total,
        };
    }

    let payload = &buf[FRAME_HEADER_SIZE..total];
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Decoded::Corrupt(
            format!(
                "crc mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            ),
            total,
        );
    }

    match rmp_serde::from_slice::<WalRecord>(payload) {
        Ok(record) => Decoded::Record(record, total),
        Err(e) => Decoded::Corrupt(format!("payload decode failed: {}", e), total),
    }
}
