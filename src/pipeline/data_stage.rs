//! Data-stage worker: owns the data log's append path.

use super::{IndexRequest, WorkerId, WriteRequest};
use crate::error::Error;
use crate::file::StorageFile;
use crate::index::Location;
use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Worker loop. Serves requests strictly in arrival order until the shutdown
/// token arrives (checked only between requests) or the request channel
/// disconnects.
pub(crate) fn run(
    requests: Receiver<WriteRequest>,
    forward: Sender<IndexRequest>,
    shutdown: Receiver<()>,
    acks: Sender<WorkerId>,
    file: Arc<dyn StorageFile>,
    file_len: Arc<AtomicU64>,
) {
    log::debug!("data stage started");

    loop {
        select! {
            recv(requests) -> msg => {
                let Ok(request) = msg else { break };
                handle(request, &forward, file.as_ref(), &file_len);
            }
            recv(shutdown) -> _ => {
                let _ = acks.send(WorkerId::DataStage);
                break;
            }
        }
    }

    log::debug!("data stage stopped");
}

/// Appends the value and forwards the resulting location to the map stage.
///
/// On an append error the request fails immediately and nothing is forwarded;
/// any bytes already flushed stay in the data log as unindexed garbage.
fn handle(
    request: WriteRequest,
    forward: &Sender<IndexRequest>,
    file: &dyn StorageFile,
    file_len: &AtomicU64,
) {
    let offset = file_len.load(Ordering::Acquire);

    match file.append(&request.value) {
        Ok(written) => {
            file_len.store(offset + written, Ordering::Release);
            let location = Location {
                offset,
                length: written,
            };

            let forwarded = IndexRequest {
                hash: request.hash,
                location,
                reply: request.reply,
            };
            if let Err(send_err) = forward.send(forwarded) {
                // Map stage is gone; the appended bytes stay unindexed.
                let request = send_err.into_inner();
                let _ = request
                    .reply
                    .send(Err(Error::write_failed("index stage unavailable")));
            }
        }
        Err(e) => {
            log::error!("data log append failed: {}", e);
            resync_len(file, file_len, "data log");
            let _ = request
                .reply
                .send(Err(Error::write_failed(format!("data append failed: {}", e))));
        }
    }
}

/// Re-syncs the length counter with the file's true size.
///
/// A failed append may still have flushed a prefix of the value; the counter
/// must track the physical file size or later offsets would collide.
pub(crate) fn resync_len(file: &dyn StorageFile, file_len: &AtomicU64, name: &str) {
    match file.len() {
        Ok(actual) => file_len.store(actual, Ordering::Release),
        Err(e) => {
            log::warn!("could not re-query {} length after failed append: {}", name, e);
        }
    }
}
