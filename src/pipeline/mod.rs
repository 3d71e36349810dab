pub mod admission;
mod decode;
mod export;
mod json;

pub use export::{local_hour, Clock};

use std::fmt::{Display, Formatter};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use crate::config::{Config, ConfigError, Distribution, OutputMode};
use crate::error::{Error, Result};
use crate::pipeline::admission::AdmissionGate;
use crate::pipeline::decode::{DecodeWorker, FileOrder, Outbound};
use crate::sink::Sink;

/// Receiving end of a bounded queue shared by several consumers.
pub(crate) type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Waits for the next item, `None` once the queue is empty and every sender
/// is gone.
pub(crate) async fn next<T>(queue: &SharedReceiver<T>) -> Option<T> {
  queue.lock().await.recv().await
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
  pub(crate) files_seen: AtomicU64,
  pub(crate) files_skipped: AtomicU64,
  pub(crate) files_failed: AtomicU64,
  pub(crate) messages_decoded: AtomicU64,
  pub(crate) messages_failed: AtomicU64,
  pub(crate) records_exported: AtomicU64,
  pub(crate) flushes: AtomicU64,
}

impl Counters {
  fn summary(&self) -> RunSummary {
    RunSummary {
      files_seen: self.files_seen.load(Ordering::Relaxed),
      files_skipped: self.files_skipped.load(Ordering::Relaxed),
      files_failed: self.files_failed.load(Ordering::Relaxed),
      messages_decoded: self.messages_decoded.load(Ordering::Relaxed),
      messages_failed: self.messages_failed.load(Ordering::Relaxed),
      records_exported: self.records_exported.load(Ordering::Relaxed),
      flushes: self.flushes.load(Ordering::Relaxed),
    }
  }
}

/// What one run did. With a full scan every worker sees every file, so
/// `files_seen` counts visits, not distinct files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub files_seen: u64,
  pub files_skipped: u64,
  pub files_failed: u64,
  pub messages_decoded: u64,
  pub messages_failed: u64,
  /// Records exported or JSON files written
  pub records_exported: u64,
  pub flushes: u64,
}

impl Display for RunSummary {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} files seen, {} skipped, {} failed, {} messages decoded, {} failed, {} exported in {} flushes",
      self.files_seen, self.files_skipped, self.files_failed, self.messages_decoded, self.messages_failed, self.records_exported, self.flushes
    )
  }
}

/// Input files of `dir`, sorted by path. Subdirectories are ignored.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();

  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    if entry.metadata()?.is_file() {
      files.push(entry.path());
    }
  }
  files.sort();

  Ok(files)
}

/// Decode workers feeding export workers through bounded queues.
pub struct Pipeline {
  config: Arc<Config>,
  sink: Option<Arc<dyn Sink>>,
  clock: Clock,
}

impl Pipeline {
  pub fn new(config: Config, sink: Option<Arc<dyn Sink>>) -> Self {
    Self {
      config: Arc::new(config),
      sink,
      clock: local_hour,
    }
  }

  pub fn with_clock(mut self, clock: Clock) -> Self {
    self.clock = clock;
    self
  }

  pub async fn run(&self) -> Result<RunSummary> {
    let source_dir = self.config.source_dir();
    let files = Arc::new(list_files(&source_dir)?);
    info!("{} files found in {:?}", files.len(), source_dir);

    let counters = Arc::new(Counters::default());
    let cancelled = Arc::new(AtomicBool::new(false));

    let gate = match self.config.output {
      OutputMode::Sink => {
        let sink = self.sink()?;
        sink.ensure_schema().await?;
        Some(AdmissionGate::new(sink, self.config.fingerprint))
      }
      OutputMode::Json | OutputMode::JsonSections => None,
    };

    let (outbound, exporters) = self.spawn_exporters(&counters, &cancelled)?;

    let cursor = Arc::new(AtomicUsize::new(0));
    let order = || match self.config.distribution {
      Distribution::FullScan => FileOrder::FullScan,
      Distribution::Claimed => FileOrder::Claimed(cursor.clone()),
    };
    let decoders: Vec<JoinHandle<Result<()>>> = (0..self.config.decode_workers)
      .map(|id| {
        let worker = DecodeWorker {
          id,
          files: files.clone(),
          order: order(),
          gate: gate.clone(),
          outbound: outbound.clone(),
          counters: counters.clone(),
          cancelled: cancelled.clone(),
        };
        spawn_worker(cancelled.clone(), worker.run())
      })
      .collect();
    // exporters stop once the last decode worker drops its sender
    drop(outbound);

    let mut failure = None;
    for handle in decoders.into_iter().chain(exporters) {
      keep_first(&mut failure, join(handle).await);
    }

    let summary = counters.summary();
    match failure {
      None => {
        info!("Run done : {}", summary);
        Ok(summary)
      }
      Some(e) => {
        error!("Run failed : {} ({})", e, summary);
        Err(e)
      }
    }
  }

  fn sink(&self) -> Result<Arc<dyn Sink>> {
    self.sink
      .clone()
      .ok_or_else(|| ConfigError::Invalid(String::from("sink output needs a sink")).into())
  }

  fn save_dir(&self) -> Result<PathBuf> {
    self.config
      .save_dir()
      .ok_or_else(|| ConfigError::Invalid(format!("saveDir is required for {:?} output", self.config.output)).into())
  }

  fn spawn_exporters(&self, counters: &Arc<Counters>, cancelled: &Arc<AtomicBool>) -> Result<(Outbound, Vec<JoinHandle<Result<()>>>)> {
    let export = &self.config.export;
    let workers = self.config.export_workers();
    info!("{} decode workers, {} export workers", self.config.decode_workers, workers);

    match self.config.output {
      OutputMode::Sink => {
        let sink = self.sink()?;
        let (tx, rx) = mpsc::channel(export.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let handles = (0..workers)
          .map(|id| {
            let task = export::export_records(id, queue.clone(), sink.clone(), export.clone(), self.clock, counters.clone());
            spawn_worker(cancelled.clone(), task)
          })
          .collect();
        Ok((Outbound::Records(tx), handles))
      }
      OutputMode::Json => {
        let base = self.save_dir()?;
        let (tx, rx) = mpsc::channel(export.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let handles = (0..workers)
          .map(|id| spawn_worker(cancelled.clone(), json::dump_records(id, queue.clone(), base.clone(), counters.clone())))
          .collect();
        Ok((Outbound::Records(tx), handles))
      }
      OutputMode::JsonSections => {
        let base = self.save_dir()?;
        let (tx, rx) = mpsc::channel(export.message_queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let handles = (0..workers)
          .map(|id| spawn_worker(cancelled.clone(), json::dump_messages(id, queue.clone(), base.clone(), counters.clone())))
          .collect();
        Ok((Outbound::Messages(tx), handles))
      }
    }
  }
}

/// A failed worker asks the others to stop at their next file.
fn spawn_worker<F>(cancelled: Arc<AtomicBool>, task: F) -> JoinHandle<Result<()>>
where
  F: Future<Output = Result<()>> + Send + 'static,
{
  tokio::spawn(async move {
    let result = task.await;
    if let Err(e) = &result {
      if !matches!(e, Error::Cancelled()) {
        error!("Worker failed : {}", e);
      }
      cancelled.store(true, Ordering::Relaxed);
    }
    result
  })
}

async fn join(handle: JoinHandle<Result<()>>) -> Result<()> {
  match handle.await {
    Ok(result) => result,
    Err(e) => Err(e.into()),
  }
}

/// Keeps the first real failure; cancellations only count when nothing else
/// went wrong.
fn keep_first(failure: &mut Option<Error>, result: Result<()>) {
  if let Err(e) = result {
    match failure {
      None => *failure = Some(e),
      Some(Error::Cancelled()) if !matches!(e, Error::Cancelled()) => *failure = Some(e),
      Some(_) => debug!("Further failure : {}", e),
    }
  }
}
