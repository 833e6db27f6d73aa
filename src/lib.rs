//! # Duolog - An Embedded Two-Log Key-Value Storage Engine
//!
//! Duolog is a minimal persistent key-value store backed by two append-only
//! files: a **data log** holding raw value bytes and an **index log** holding
//! committed `(key-hash, offset, length)` records. Strictly append-only: no
//! in-place updates, no compaction, no transactions.
//!
//! ## Architecture
//!
//! ```text
//!  set(key, value)                       get(key)
//!        │                                  │
//!        ▼                                  ▼
//!  ┌─────────────┐   location   ┌──────────────────────┐
//!  │ Data Stage  ├─────────────▶│ In-memory index      │◀── lookups
//!  │ (data log)  │              │ (hash → location)    │
//!  └─────────────┘              └──────────▲───────────┘
//!                                          │ publish
//!                               ┌──────────┴───────────┐
//!                               │ Map Stage            │
//!                               │ (index log)          │
//!                               └──────────────────────┘
//! ```
//!
//! Writes flow through a two-stage pipeline: a single worker appends the
//! value to the data log and computes its location, a second worker appends
//! the index record and publishes the binding. Each log has exactly one
//! writer, which is what makes offsets unambiguous. Reads bypass the
//! pipeline entirely. At startup the index is rebuilt by replaying the index
//! log, which is how the engine recovers from crashes.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use duolog::{Engine, Options};
//!
//! # fn main() -> Result<(), duolog::Error> {
//! let engine = Engine::open("./data", Options::default())?;
//!
//! engine.set(b"key1", b"value1")?;
//!
//! if let Some(value) = engine.get(b"key1")? {
//!     println!("Found: {:?}", value);
//! }
//!
//! engine.shutdown();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod file;
pub mod index;

mod pipeline;

// Re-exports
pub use config::Options;
pub use error::{Error, Result};
pub use file::StorageFile;
pub use index::{hash_key, Index, KeyHash, Location};

use crossbeam::channel::bounded;
use parking_lot::Mutex;
use pipeline::{Pipeline, WriteRequest};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The main storage engine handle.
///
/// Composes index recovery, the two-stage write pipeline, the concurrent
/// read path, and the shutdown handshake behind `get`/`set`/`shutdown`.
///
/// # Thread Safety
///
/// `Engine` is thread-safe and can be shared across threads using
/// `Arc<Engine>`. `get` runs concurrently with other reads and with in-flight
/// writes; `set` blocks its caller for the full two-stage round trip.
pub struct Engine {
    /// Configuration options
    options: Options,

    /// In-memory key-hash to location mapping; written only by the map stage
    index: Arc<Index>,

    /// Data log handle, shared between the read path and the data stage
    data_file: Arc<dyn StorageFile>,

    /// Index log handle, appended to only by the map stage
    map_file: Arc<dyn StorageFile>,

    /// Running data log length, advanced by the data stage
    data_len: Arc<AtomicU64>,

    /// Running index log length, advanced by the map stage
    map_len: Arc<AtomicU64>,

    /// Pipeline workers; taken exactly once by shutdown
    pipeline: Mutex<Option<Pipeline>>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DATA_FILENAME: &'static str = "data.log";
    const MAP_FILENAME: &'static str = "index.map";

    /// Opens or creates an engine rooted at the given directory.
    ///
    /// Creates `data.log` and `index.map` inside `path` (if
    /// `create_if_missing` allows), replays the index log, and spawns the
    /// pipeline workers.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or files cannot be opened, if the
    /// options are invalid, or if recovery hits an I/O error mid-record. No
    /// partially-initialized engine is ever produced.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            if options.create_if_missing {
                std::fs::create_dir_all(path)?;
            } else {
                return Err(Error::invalid_argument(format!(
                    "data directory does not exist: {:?}",
                    path
                )));
            }
        }

        let data_file = Self::open_log(&path.join(Self::DATA_FILENAME), &options)?;
        let map_file = Self::open_log(&path.join(Self::MAP_FILENAME), &options)?;

        Self::with_files(Arc::new(data_file), Arc::new(map_file), options)
    }

    /// Opens one log file in read + append mode.
    fn open_log(path: &Path, options: &Options) -> Result<std::fs::File> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(options.create_if_missing)
            .open(path)?;
        Ok(file)
    }

    /// Builds an engine from two externally supplied log handles.
    ///
    /// Construction synchronously replays the index log against `map_file`
    /// before the engine becomes usable; the recovered byte count seeds the
    /// index-log length counter and the data log's size query seeds the data
    /// counter.
    pub fn with_files(
        data_file: Arc<dyn StorageFile>,
        map_file: Arc<dyn StorageFile>,
        options: Options,
    ) -> Result<Self> {
        options.validate()?;

        // Step 1: Rebuild the index from the index log (fatal on I/O error).
        let (index, map_consumed) = index::recovery::recover(map_file.as_ref())?;
        let index = Arc::new(index);

        // Step 2: Seed the length counters.
        let data_size = data_file.len()?;
        let data_len = Arc::new(AtomicU64::new(data_size));
        let map_len = Arc::new(AtomicU64::new(map_consumed));

        // Step 3: Spawn the stage workers.
        let pipeline = Pipeline::spawn(
            Arc::clone(&data_file),
            Arc::clone(&map_file),
            Arc::clone(&index),
            Arc::clone(&data_len),
            Arc::clone(&map_len),
            options.queue_capacity,
        )?;

        log::info!(
            "engine started: {} keys recovered, data log {} bytes, index log {} bytes",
            index.len(),
            data_size,
            map_consumed
        );

        Ok(Self {
            options,
            index,
            data_file,
            map_file,
            data_len,
            map_len,
            pipeline: Mutex::new(Some(pipeline)),
        })
    }

    /// Retrieves the value stored for a key.
    ///
    /// Returns `Ok(None)` if the key has never been written — absence is not
    /// an error. An I/O failure, including a recorded length that overruns
    /// the data log, is returned verbatim.
    ///
    /// Safe to call from any number of threads concurrently with each other
    /// and with in-flight writes.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let hash = index::hash_key(key);

        let location = match self.index.get(&hash) {
            Some(location) => location,
            None => return Ok(None),
        };

        let mut value = vec![0u8; location.length as usize];
        self.data_file.read_exact_at(&mut value, location.offset)?;
        Ok(Some(value))
    }

    /// Stores a value for a key, blocking until it is committed.
    ///
    /// Success is reported only once both the data-log append and the
    /// index-log append have completed; the caller's latency spans the full
    /// two-stage pipeline. Writing the same key again appends a new value —
    /// the old bytes stay in the data log, unreferenced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailed`] if either append fails, and
    /// [`Error::InvalidState`] after shutdown. A failed write never affects
    /// other requests.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        // Clone the sender under the lock, then release it: replies must not
        // serialize behind the shutdown mutex.
        let writes = {
            let pipeline = self.pipeline.lock();
            match pipeline.as_ref() {
                Some(pipeline) => pipeline.writes(),
                None => return Err(Error::invalid_state("engine is shut down")),
            }
        };

        let (reply_tx, reply_rx) = bounded(1);
        let request = WriteRequest {
            hash: index::hash_key(key),
            value: value.to_vec(),
            reply: reply_tx,
        };

        writes
            .send(request)
            .map_err(|_| Error::write_failed("write pipeline unavailable"))?;

        match reply_rx.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::write_failed("write pipeline dropped the request")),
        }
    }

    /// Shuts the engine down.
    ///
    /// Signals both stage workers, waits until each has acknowledged (in
    /// either order), then syncs both logs. Sync/close errors are logged,
    /// never raised. A second call is a no-op; `set` afterwards returns
    /// [`Error::InvalidState`].
    pub fn shutdown(&self) {
        let pipeline = self.pipeline.lock().take();
        let Some(pipeline) = pipeline else { return };

        pipeline.shutdown();

        if let Err(e) = self.data_file.sync() {
            log::error!("error closing data log: {}", e);
        }
        if let Err(e) = self.map_file.sync() {
            log::error!("error closing index log: {}", e);
        }

        log::info!("engine shut down");
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Current data log length in bytes.
    pub fn data_file_len(&self) -> u64 {
        self.data_len.load(Ordering::Acquire)
    }

    /// Current index log length in bytes (torn tails found at recovery are
    /// not counted).
    pub fn map_file_len(&self) -> u64 {
        self.map_len.load(Ordering::Acquire)
    }

    /// Number of distinct keys currently indexed.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// The configuration the engine was opened with.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Best-effort drain if the caller never shut down explicitly.
        self.shutdown();
    }
}
