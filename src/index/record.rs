//! On-disk index record format.
//!
//! Each record is exactly 48 bytes:
//! - Key hash (32 bytes): SHA-256 digest of the key
//! - Offset (8 bytes): big-endian u64 byte offset into the data log
//! - Length (8 bytes): big-endian u64 value length in bytes
//!
//! Records carry no checksum or framing; the fixed size is the framing. A
//! trailing fragment shorter than 48 bytes is a torn write and is dropped
//! during recovery.

use super::KeyHash;
use bytes::{Buf, BufMut, BytesMut};

/// Size of an encoded index record in bytes.
pub const RECORD_SIZE: usize = 48;

/// A value's position in the data log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset of the value in the data log.
    pub offset: u64,
    /// Length of the value in bytes.
    pub length: u64,
}

/// A single committed key-to-location binding, as stored in the index log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Digest of the key this record binds.
    pub hash: KeyHash,
    /// Where the value lives in the data log.
    pub location: Location,
}

impl IndexRecord {
    /// Creates a new record.
    pub fn new(hash: KeyHash, location: Location) -> Self {
        Self { hash, location }
    }

    /// Encodes the record into its 48-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = BytesMut::with_capacity(RECORD_SIZE);
        buf.put_slice(&self.hash);
        buf.put_u64(self.location.offset);
        buf.put_u64(self.location.length);

        let mut record = [0u8; RECORD_SIZE];
        record.copy_from_slice(&buf);
        record
    }

    /// Decodes a record from its 48-byte wire form.
    pub fn decode(data: &[u8; RECORD_SIZE]) -> Self {
        let mut data = &data[..];
        let mut hash = [0u8; 32];
        data.copy_to_slice(&mut hash);
        let offset = data.get_u64();
        let length = data.get_u64();

        Self {
            hash,
            location: Location { offset, length },
        }
    }
}
