//! Two-stage write pipeline.
//!
//! All writes flow through two dedicated worker threads connected by
//! channels:
//!
//! 1. **Data stage** — appends the value to the data log and computes its
//!    location. Single owner of the data log's append path, so offsets can
//!    never collide.
//! 2. **Map stage** — appends the 48-byte index record to the index log and
//!    publishes the binding into the in-memory index. Single owner of the
//!    index log, so every published entry corresponds to a durably appended
//!    record.
//!
//! Each stage serves requests strictly in arrival order. A request failure is
//! reported on that request's reply channel and never aborts the worker loop.
//!
//! Shutdown is cooperative: the coordinator sends one token per worker on a
//! shared trigger channel; each worker observes it only between requests,
//! reports its identity on the fan-in acknowledgement channel, and exits. The
//! coordinator tolerates acknowledgements in either order.

pub(crate) mod data_stage;
pub(crate) mod map_stage;

use crate::error::Result;
use crate::file::StorageFile;
use crate::index::{Index, KeyHash, Location};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Identity a stage worker reports when acknowledging shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerId {
    /// The data-log append worker.
    DataStage,
    /// The index-log append worker.
    MapStage,
}

/// One-shot reply channel back to the blocked `set` caller.
pub(crate) type WriteReply = Sender<Result<()>>;

/// Stage-1 request: append the value and compute its location.
pub(crate) struct WriteRequest {
    pub hash: KeyHash,
    pub value: Vec<u8>,
    pub reply: WriteReply,
}

/// Stage-2 request: durably record and publish the binding.
pub(crate) struct IndexRequest {
    pub hash: KeyHash,
    pub location: Location,
    pub reply: WriteReply,
}

/// Handle to the two running stage workers.
pub(crate) struct Pipeline {
    writes: Sender<WriteRequest>,
    shutdown: Sender<()>,
    acks: Receiver<WorkerId>,
    data_worker: JoinHandle<()>,
    map_worker: JoinHandle<()>,
}

impl Pipeline {
    /// Spawns both stage workers and wires their channels.
    pub fn spawn(
        data_file: Arc<dyn StorageFile>,
        map_file: Arc<dyn StorageFile>,
        index: Arc<Index>,
        data_len: Arc<AtomicU64>,
        map_len: Arc<AtomicU64>,
        queue_capacity: usize,
    ) -> Result<Self> {
        let (write_tx, write_rx) = bounded::<WriteRequest>(queue_capacity);
        let (index_tx, index_rx) = bounded::<IndexRequest>(queue_capacity);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(2);
        let (ack_tx, ack_rx) = bounded::<WorkerId>(2);

        let data_worker = thread::Builder::new()
            .name("duolog-data-stage".to_string())
            .spawn({
                let shutdown = shutdown_rx.clone();
                let acks = ack_tx.clone();
                move || data_stage::run(write_rx, index_tx, shutdown, acks, data_file, data_len)
            })
            .map_err(crate::Error::Io)?;

        let map_worker = thread::Builder::new()
            .name("duolog-map-stage".to_string())
            .spawn(move || {
                map_stage::run(index_rx, shutdown_rx, ack_tx, map_file, index, map_len)
            })
            .map_err(crate::Error::Io)?;

        Ok(Self {
            writes: write_tx,
            shutdown: shutdown_tx,
            acks: ack_rx,
            data_worker,
            map_worker,
        })
    }

    /// Returns a sender for submitting writes to the data stage.
    pub fn writes(&self) -> Sender<WriteRequest> {
        self.writes.clone()
    }

    /// Stops both workers and blocks until each has acknowledged.
    ///
    /// Always returns once both workers have stopped, even if a stage served
    /// zero requests during the pipeline's lifetime.
    pub fn shutdown(self) {
        // One token per worker; each stage consumes exactly one.
        for _ in 0..2 {
            if self.shutdown.send(()).is_err() {
                break;
            }
        }

        let mut data_stopped = false;
        let mut map_stopped = false;
        while !(data_stopped && map_stopped) {
            match self.acks.recv() {
                Ok(WorkerId::DataStage) => data_stopped = true,
                Ok(WorkerId::MapStage) => map_stopped = true,
                // A worker exited without acknowledging: either it panicked,
                // or it saw its request channel disconnect and broke out of
                // its loop. Either way there is nothing left to wait for.
                Err(_) => break,
            }
        }

        if self.data_worker.join().is_err() {
            log::error!("data stage worker panicked");
        }
        if self.map_worker.join().is_err() {
            log::error!("map stage worker panicked");
        }

        log::debug!("pipeline stages drained");
    }
}
