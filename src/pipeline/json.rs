use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use serde::Serialize;
use tokio::fs;
use crate::error::Result;
use crate::grib::Message;
use crate::pipeline::{next, Counters, SharedReceiver};
use crate::record::{Descriptor, Record};
use crate::stamp::Stamp;

async fn write_json<T: Serialize>(dir: PathBuf, file_name: String, value: &T) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(&dir).await?;
        debug!("{:?} created successfully", dir);
    }

    let path = dir.join(file_name);
    let json = serde_json::to_vec(value)?;
    fs::write(&path, json).await?;

    Ok(path)
}

/// `<base>/<reference time>/<forecast offset>/<parameter>_<surface>_<value>.json`
pub(crate) async fn write_record(base: &Path, record: &Record) -> Result<PathBuf> {
    write_json(record.stamp().dir(base), record.file_name(), record).await
}

/// Same layout as [`write_record`], with every decoded section in the file.
pub(crate) async fn write_message(base: &Path, message: &Message) -> Result<PathBuf> {
    let descriptor = Descriptor::of(message).map_err(crate::grib::GribError::from)?;
    let stamp = Stamp::new(message.identification.ref_time, descriptor.forecast_offset);

    write_json(stamp.dir(base), descriptor.file_name(), message).await
}

pub(crate) async fn dump_records(id: usize, queue: SharedReceiver<Record>, base: PathBuf, counters: Arc<Counters>) -> Result<()> {
    info!("Json worker #{} started", id);

    while let Some(record) = next(&queue).await {
        let path = write_record(&base, &record).await?;
        debug!("`{}` written to {:?}", record.stamp(), path);
        counters.records_exported.fetch_add(1, Ordering::Relaxed);
    }

    info!("Json worker #{} done", id);
    Ok(())
}

pub(crate) async fn dump_messages(id: usize, queue: SharedReceiver<Message>, base: PathBuf, counters: Arc<Counters>) -> Result<()> {
    info!("Json worker #{} started", id);

    while let Some(message) = next(&queue).await {
        match write_message(&base, &message).await {
            Ok(path) => {
                debug!("Message written to {:?}", path);
                counters.records_exported.fetch_add(1, Ordering::Relaxed);
            }
            Err(crate::error::Error::GribError(e)) => {
                warn!("Message not written : {}", e);
                counters.messages_failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => return Err(e),
        }
    }

    info!("Json worker #{} done", id);
    Ok(())
}
