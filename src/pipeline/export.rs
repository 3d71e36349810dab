use std::sync::Arc;
use std::sync::atomic::Ordering;
use chrono::Timelike;
use tokio::time::{self, Duration};
use crate::config::ExportConfig;
use crate::error::Result;
use crate::pipeline::{next, Counters, SharedReceiver};
use crate::record::Record;
use crate::sink::{ChunkRow, Destination, GridRow, Sink, SinkConnection, SinkError};

/// Hour of day used to pick the destination tables.
pub type Clock = fn() -> u32;

pub fn local_hour() -> u32 {
  chrono::Local::now().hour()
}

/// Accumulates chunk rows and writes them to the sink in batches.
///
/// The destination is picked when the exporter opens and again at the first
/// record boundary after every flush, so a single record never straddles two
/// destinations. The connection is replaced after each flush.
pub(crate) struct BatchExporter {
  sink: Arc<dyn Sink>,
  connection: Box<dyn SinkConnection>,
  config: ExportConfig,
  clock: Clock,
  destination: Destination,
  reselect: bool,
  batch: Vec<ChunkRow>,
  flushes: u64,
}

impl BatchExporter {
  pub(crate) async fn open(sink: Arc<dyn Sink>, config: ExportConfig, clock: Clock) -> Result<Self> {
    let mut connection = sink.connect().await?;
    let destination = select_destination(connection.as_mut(), &config, clock).await?;

    Ok(Self {
      sink,
      connection,
      batch: Vec::with_capacity(config.batch_rows),
      config,
      clock,
      destination,
      reselect: false,
      flushes: 0,
    })
  }

  pub(crate) fn destination(&self) -> Destination {
    self.destination
  }

  /// Inserts the grid row of `record` right away and appends its chunk rows
  /// to the batch, flushing whenever the batch is full.
  pub(crate) async fn push(&mut self, record: &Record) -> Result<()> {
    if self.reselect {
      let destination = select_destination(self.connection.as_mut(), &self.config, self.clock).await?;
      if destination != self.destination && !self.batch.is_empty() {
        // leftover chunks go to the data table paired with their grid rows
        self.flush().await?;
      }
      self.destination = destination;
      self.reselect = false;
    }

    let row = GridRow::from_record(record)?;
    self.connection.insert_row(self.destination.grid_table(), &row).await?;

    for chunk in ChunkRow::split(record, self.config.chunk_size) {
      self.batch.push(chunk);
      if self.batch.len() >= self.config.batch_rows {
        self.flush().await?;
      }
    }

    Ok(())
  }

  async fn flush(&mut self) -> Result<()> {
    let table = self.destination.data_table();

    let mut attempt = 0;
    while let Err(e) = self.connection.insert_batch(table, &self.batch).await {
      if attempt >= self.config.flush_retries {
        return Err(SinkError::FlushExhausted {
          attempts: attempt + 1,
          last: Box::new(e),
        }.into());
      }
      attempt += 1;
      let delay = backoff(self.config.flush_backoff_ms, attempt);
      warn!("{} : flush of {} rows failed ({}), retry {}/{} in {:?}", table, self.batch.len(), e, attempt, self.config.flush_retries, delay);
      time::sleep(delay).await;
    }

    debug!("{} : {} rows flushed", table, self.batch.len());
    self.batch.clear();
    self.flushes += 1;

    self.connection = self.sink.connect().await?;
    self.reselect = true;

    Ok(())
  }

  /// Flushes what is left and returns the number of flushes done.
  pub(crate) async fn finish(mut self) -> Result<u64> {
    if !self.batch.is_empty() {
      self.flush().await?;
    }
    Ok(self.flushes)
  }
}

async fn select_destination(connection: &mut dyn SinkConnection, config: &ExportConfig, clock: Clock) -> Result<Destination> {
  let ingested = connection.ingested_count().await?;
  let destination = Destination::select(ingested, config.file_threshold, clock());
  debug!("{} files ingested, writing to {}", ingested, destination);
  Ok(destination)
}

/// `base_ms * 2^(attempt - 1)`
fn backoff(base_ms: u64, attempt: u32) -> Duration {
  let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
  Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Drains the record queue into the sink until every producer is gone.
pub(crate) async fn export_records(id: usize, queue: SharedReceiver<Record>, sink: Arc<dyn Sink>, config: ExportConfig, clock: Clock, counters: Arc<Counters>) -> Result<()> {
  info!("Export worker #{} started", id);

  let mut exporter = BatchExporter::open(sink, config, clock).await?;
  while let Some(record) = next(&queue).await {
    exporter.push(&record).await?;
    counters.records_exported.fetch_add(1, Ordering::Relaxed);
  }

  let flushes = exporter.finish().await?;
  counters.flushes.fetch_add(flushes, Ordering::Relaxed);

  info!("Export worker #{} done, {} flushes", id, flushes);
  Ok(())
}
