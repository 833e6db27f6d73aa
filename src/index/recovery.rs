//! Index recovery from the on-disk index log.
//!
//! At startup the index log is scanned once, front to back, in fixed 48-byte
//! steps. Every complete record overwrites the in-memory binding for its
//! hash, so the last occurrence of a key wins — exactly the order appends
//! happened in. A short trailing fragment is a torn write from an
//! interrupted append and is dropped silently; a real I/O error mid-scan is
//! fatal and aborts engine construction.

use super::record::{IndexRecord, RECORD_SIZE};
use super::Index;
use crate::error::Result;
use crate::file::StorageFile;
use std::io;

/// Rebuilds the index by replaying the index log.
///
/// Returns the populated index and the number of bytes actually consumed (a
/// multiple of 48; any torn tail is excluded). The consumed count seeds the
/// engine's index-log length counter.
pub fn recover(file: &dyn StorageFile) -> Result<(Index, u64)> {
    let index = Index::new();
    let mut consumed: u64 = 0;
    let mut records: u64 = 0;
    let mut buf = [0u8; RECORD_SIZE];

    loop {
        let n = read_full(file, &mut buf, consumed)?;
        if n < RECORD_SIZE {
            if n > 0 {
                log::warn!(
                    "dropping torn {}-byte fragment at end of index log (offset {})",
                    n,
                    consumed
                );
            }
            break;
        }

        let record = IndexRecord::decode(&buf);
        index.insert(record.hash, record.location);
        consumed += RECORD_SIZE as u64;
        records += 1;
    }

    log::info!(
        "index recovery: {} records replayed, {} distinct keys, {} bytes consumed",
        records,
        index.len(),
        consumed
    );

    Ok((index, consumed))
}

/// Reads at `offset` until `buf` is full or end-of-file.
///
/// Returns how many bytes were read; anything short of `buf.len()` means the
/// log ended. An I/O error is propagated as-is and aborts recovery.
fn read_full(file: &dyn StorageFile, buf: &mut [u8], offset: u64) -> Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match file.read_at(&mut buf[read..], offset + read as u64) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}
