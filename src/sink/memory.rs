use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;
use crate::sink::{ChunkRow, Fingerprint, GridRow, Result, Sink, SinkConnection, SinkError};

#[derive(Debug, Default)]
struct State {
    schema_ensured: bool,
    ingested: HashSet<Fingerprint>,
    /// Files counted as ingested before this sink was created
    preexisting: u64,
    grid_rows: HashMap<String, Vec<GridRow>>,
    chunk_rows: HashMap<String, Vec<ChunkRow>>,
    flushes: Vec<(String, usize)>,
    failed_flushes: u32,
    pending_failures: u32,
    connections: u64,
}

/// Sink that keeps everything in process memory. Used when no persistent
/// backend is configured, and by the tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<State>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `count` files already ingested.
    pub fn with_ingested_count(count: u64) -> Self {
        let sink = Self::default();
        sink.lock().preexisting = count;
        sink
    }

    /// The next `count` batch inserts fail with a query error.
    pub fn fail_next_flushes(&self, count: u32) {
        self.lock().pending_failures = count;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a poisoned lock only means a test thread panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn schema_ensured(&self) -> bool {
        self.lock().schema_ensured
    }

    pub fn is_ingested(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().ingested.contains(fingerprint)
    }

    pub fn grid_rows(&self, table: &str) -> Vec<GridRow> {
        self.lock().grid_rows.get(table).cloned().unwrap_or_default()
    }

    pub fn chunk_rows(&self, table: &str) -> Vec<ChunkRow> {
        self.lock().chunk_rows.get(table).cloned().unwrap_or_default()
    }

    /// Successful batch inserts as `(table, rows)`, in order.
    pub fn flushes(&self) -> Vec<(String, usize)> {
        self.lock().flushes.clone()
    }

    pub fn failed_flushes(&self) -> u32 {
        self.lock().failed_flushes
    }

    pub fn connections(&self) -> u64 {
        self.lock().connections
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn ensure_schema(&self) -> Result<()> {
        self.lock().schema_ensured = true;
        Ok(())
    }

    async fn connect(&self) -> Result<Box<dyn SinkConnection>> {
        self.lock().connections += 1;
        Ok(Box::new(MemoryConnection {
            sink: self.clone(),
        }))
    }
}

struct MemoryConnection {
    sink: MemorySink,
}

#[async_trait]
impl SinkConnection for MemoryConnection {
    async fn has_already_ingested(&mut self, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(self.sink.is_ingested(fingerprint))
    }

    async fn record_ingested(&mut self, fingerprint: &Fingerprint) -> Result<()> {
        self.sink.lock().ingested.insert(fingerprint.clone());
        Ok(())
    }

    async fn ingested_count(&mut self) -> Result<u64> {
        let state = self.sink.lock();
        Ok(state.preexisting + state.ingested.len() as u64)
    }

    async fn insert_row(&mut self, table: &str, row: &GridRow) -> Result<()> {
        self.sink
            .lock()
            .grid_rows
            .entry(String::from(table))
            .or_default()
            .push(row.clone());
        Ok(())
    }

    async fn insert_batch(&mut self, table: &str, rows: &[ChunkRow]) -> Result<()> {
        let mut state = self.sink.lock();

        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            state.failed_flushes += 1;
            return Err(SinkError::Query(format!("batch insert into {} rejected", table)));
        }

        state.flushes.push((String::from(table), rows.len()));
        state
            .chunk_rows
            .entry(String::from(table))
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_then_register_is_not_atomic() {
        let sink = MemorySink::new();
        let fingerprint = Fingerprint::from("abc");
        let mut first = sink.connect().await.unwrap();
        let mut second = sink.connect().await.unwrap();

        let (a, b) = tokio::join!(
            first.has_already_ingested(&fingerprint),
            second.has_already_ingested(&fingerprint)
        );
        assert!(!a.unwrap());
        assert!(!b.unwrap());

        first.record_ingested(&fingerprint).await.unwrap();
        second.record_ingested(&fingerprint).await.unwrap();

        assert!(first.has_already_ingested(&fingerprint).await.unwrap());
        assert!(second.has_already_ingested(&fingerprint).await.unwrap());
        assert_eq!(first.ingested_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let sink = MemorySink::new();
        sink.fail_next_flushes(1);
        let mut connection = sink.connect().await.unwrap();

        assert!(connection.insert_batch("grib_data", &[]).await.is_err());
        assert!(connection.insert_batch("grib_data", &[]).await.is_ok());

        assert_eq!(sink.failed_flushes(), 1);
        assert_eq!(sink.flushes(), vec![(String::from("grib_data"), 0)]);
    }

    #[tokio::test]
    async fn preexisting_count() {
        let sink = MemorySink::with_ingested_count(40);
        let mut connection = sink.connect().await.unwrap();

        connection.record_ingested(&Fingerprint::from("x")).await.unwrap();

        assert_eq!(connection.ingested_count().await.unwrap(), 41);
    }
}
