//! File abstraction for the engine's two logs.
//!
//! The engine is constructed from two externally supplied handles: the data
//! log and the index log. Each handle must support random-offset reads (the
//! read path and recovery), append-only writes (the stage workers), and size
//! queries (offset bookkeeping). `StorageFile` captures exactly that contract
//! so tests can substitute in-memory or fault-injecting implementations.

use std::fs::File;
use std::io::{self, Write};

/// The capabilities the engine requires from each of its log files.
///
/// All methods take `&self`: reads and appends on the same handle may overlap
/// from different threads, and the engine relies on the OS (or the
/// implementation) to keep positional reads independent of the append cursor.
pub trait StorageFile: Send + Sync {
    /// Reads up to `buf.len()` bytes at `offset`, returning how many were read.
    ///
    /// A return of 0 means end-of-file. Like `pread`, a short read is not an
    /// error.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Appends `data` at the end of the file, returning the bytes written.
    fn append(&self, data: &[u8]) -> io::Result<u64>;

    /// Returns the current size of the file in bytes.
    fn len(&self) -> io::Result<u64>;

    /// Returns true if the file is empty.
    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flushes buffered data to durable storage.
    ///
    /// Called once at shutdown; the handle itself closes when dropped.
    fn sync(&self) -> io::Result<()>;

    /// Reads exactly `buf.len()` bytes at `offset`.
    ///
    /// Fails with `UnexpectedEof` if the file ends before the buffer is
    /// filled, so a recorded length that overruns the file surfaces as an
    /// error rather than a truncated read.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let mut buf = buf;
        let mut offset = offset;
        while !buf.is_empty() {
            match self.read_at(buf, offset) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ));
                }
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl StorageFile for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }

    fn append(&self, data: &[u8]) -> io::Result<u64> {
        // The handle is opened in append mode; writes land at the physical
        // end of the file regardless of any read cursor.
        let mut file = self;
        file.write_all(data)?;
        Ok(data.len() as u64)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.sync_all()
    }
}
