use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use flate2::read::GzDecoder;
use tokio::sync::mpsc::Sender;
use crate::error::{Error, Result};
use crate::grib::{GribReader, Message};
use crate::pipeline::Counters;
use crate::pipeline::admission::{Admission, AdmissionGate};
use crate::record::Record;

/// Where decoded messages go: records for the batch export and per-record
/// JSON, whole messages for section dumps.
#[derive(Clone)]
pub(crate) enum Outbound {
    Records(Sender<Record>),
    Messages(Sender<Message>),
}

impl Outbound {
    /// Blocks while the queue is full.
    fn push(&self, message: Message, counters: &Counters) -> Result<()> {
        match self {
            Outbound::Records(tx) => match Record::from_message(message) {
                Ok(record) => tx.blocking_send(record).map_err(|_| Error::QueueClosed()),
                Err(e) => {
                    warn!("Message skipped : {}", e);
                    counters.messages_failed.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            },
            Outbound::Messages(tx) => tx.blocking_send(message).map_err(|_| Error::QueueClosed()),
        }
    }
}

/// Files ending in `.gz` are gunzipped on the fly.
pub(crate) fn open_input(path: &Path) -> std::io::Result<Box<dyn Read + Send>> {
    let file = File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Decodes every message of one file and pushes it downstream. Runs on a
/// blocking thread. Malformed messages are logged and skipped; only a closed
/// queue is an error.
pub(crate) fn decode_file(path: &Path, outbound: &Outbound, counters: &Counters) -> Result<()> {
    let input = match open_input(path) {
        Ok(input) => input,
        Err(e) => {
            error!("{:?} : cannot open : {}", path, e);
            counters.files_failed.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
    };

    let mut decoded = 0;
    let mut failed = false;
    for (i, message) in GribReader::new(input).enumerate() {
        match message {
            Ok(message) => {
                decoded += 1;
                counters.messages_decoded.fetch_add(1, Ordering::Relaxed);
                outbound.push(message, counters)?;
            }
            Err(e) => {
                counters.messages_failed.fetch_add(1, Ordering::Relaxed);
                if e.is_fatal_to_file() {
                    error!("{:?} : message #{} : {}, file abandoned", path, i, e);
                    failed = true;
                } else {
                    warn!("{:?} : message #{} : {}", path, i, e);
                }
            }
        }
    }

    if failed {
        counters.files_failed.fetch_add(1, Ordering::Relaxed);
    }
    info!("{:?} : {} messages decoded", path, decoded);

    Ok(())
}

pub(crate) enum FileOrder {
    /// Every worker walks the whole list
    FullScan,
    /// Workers take the next unclaimed index
    Claimed(Arc<AtomicUsize>),
}

pub(crate) struct DecodeWorker {
    pub(crate) id: usize,
    pub(crate) files: Arc<Vec<PathBuf>>,
    pub(crate) order: FileOrder,
    pub(crate) gate: Option<AdmissionGate>,
    pub(crate) outbound: Outbound,
    pub(crate) counters: Arc<Counters>,
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl DecodeWorker {
    fn next_file(&self, scanned: &mut usize) -> Option<PathBuf> {
        let index = match &self.order {
            FileOrder::FullScan => {
                let index = *scanned;
                *scanned += 1;
                index
            }
            FileOrder::Claimed(cursor) => cursor.fetch_add(1, Ordering::Relaxed),
        };
        self.files.get(index).cloned()
    }

    pub(crate) async fn run(self) -> Result<()> {
        info!("Decode worker #{} started", self.id);

        let mut scanned = 0;
        while let Some(path) = self.next_file(&mut scanned) {
            if self.cancelled.load(Ordering::Relaxed) {
                info!("Decode worker #{} cancelled", self.id);
                return Err(Error::Cancelled());
            }
            self.counters.files_seen.fetch_add(1, Ordering::Relaxed);

            if let Some(gate) = &self.gate {
                match gate.admit(&path).await {
                    Ok(Admission::Proceed(fingerprint)) => {
                        debug!("{:?} admitted as {}", path, fingerprint);
                    }
                    Ok(Admission::AlreadyIngested(_)) => {
                        info!("{:?} already ingested, skipped", path);
                        self.counters.files_skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    Err(e) => {
                        error!("{:?} : admission failed : {}", path, e);
                        self.counters.files_failed.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                }
            }

            let outbound = self.outbound.clone();
            let counters = self.counters.clone();
            tokio::task::spawn_blocking(move || decode_file(&path, &outbound, &counters)).await??;
        }

        info!("Decode worker #{} done", self.id);
        Ok(())
    }
}
