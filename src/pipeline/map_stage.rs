//! Map-stage worker: owns the index log's append path and publishes
//! committed bindings into the in-memory index.

use super::data_stage::resync_len;
use super::{IndexRequest, WorkerId};
use crate::error::Error;
use crate::file::StorageFile;
use crate::index::{Index, IndexRecord};
use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Worker loop. Fed exclusively by the data stage; serves requests strictly
/// in arrival order, which linearizes index-log appends with index mutation.
pub(crate) fn run(
    requests: Receiver<IndexRequest>,
    shutdown: Receiver<()>,
    acks: Sender<WorkerId>,
    file: Arc<dyn StorageFile>,
    index: Arc<Index>,
    file_len: Arc<AtomicU64>,
) {
    log::debug!("map stage started");

    loop {
        select! {
            recv(requests) -> msg => {
                let Ok(request) = msg else { break };
                handle(request, file.as_ref(), &index, &file_len);
            }
            recv(shutdown) -> _ => {
                let _ = acks.send(WorkerId::MapStage);
                break;
            }
        }
    }

    log::debug!("map stage stopped");
}

/// Appends the record, then publishes the binding.
///
/// The index is only mutated after the append succeeded, so every index
/// entry corresponds to a durably appended record. On failure the index is
/// left untouched and the caller is told; the value bytes already in the
/// data log remain as unindexed garbage.
fn handle(request: IndexRequest, file: &dyn StorageFile, index: &Index, file_len: &AtomicU64) {
    let record = IndexRecord::new(request.hash, request.location);

    match file.append(&record.encode()) {
        Ok(written) => {
            file_len.fetch_add(written, Ordering::AcqRel);
            index.insert(request.hash, request.location);
            let _ = request.reply.send(Ok(()));
        }
        Err(e) => {
            log::error!("index log append failed: {}", e);
            resync_len(file, file_len, "index log");
            let _ = request
                .reply
                .send(Err(Error::write_failed(format!("index append failed: {}", e))));
        }
    }
}
