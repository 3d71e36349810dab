pub mod memory;

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::path::Path;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use crate::record::Record;

pub type Result<T, E = SinkError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("Connection({0})")]
    Connection(String),

    #[error("Query({0})")]
    Query(String),

    #[error("FlushExhausted(after {attempts} attempts: {last})")]
    FlushExhausted { attempts: u32, last: Box<SinkError> },

    #[error("JsonError({0})")]
    JsonError(#[from] serde_json::Error),
}

/// How input files are identified for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FingerprintKind {
    ContentHash,
    FileName,
}

impl Default for FingerprintKind {
    fn default() -> Self {
        FingerprintKind::ContentHash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hashes or names the file as stored, before any decompression.
    pub fn compute(kind: FingerprintKind, path: &Path) -> io::Result<Self> {
        match kind {
            FingerprintKind::ContentHash => {
                let mut file = File::open(path)?;
                let mut hasher = Sha256::new();
                io::copy(&mut file, &mut hasher)?;
                Ok(Fingerprint(hex::encode(hasher.finalize())))
            }
            FingerprintKind::FileName => {
                let name = path
                    .file_name()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("{:?} has no file name", path)))?;
                Ok(Fingerprint(name.to_string_lossy().to_string()))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Fingerprint(String::from(value))
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pair of tables a batch is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Primary,
    Buffer,
}

impl Destination {
    /// Past `threshold` ingested files everything goes to the buffer tables.
    /// Below it, hours 0 and 12 go to the buffer tables and every other hour
    /// to the primary ones.
    pub fn select(ingested: u64, threshold: u64, hour: u32) -> Self {
        if ingested >= threshold {
            return Destination::Buffer;
        }
        match hour {
            0 | 12 => Destination::Buffer,
            _ => Destination::Primary,
        }
    }

    pub fn data_table(&self) -> &'static str {
        match self {
            Destination::Primary => "grib_data",
            Destination::Buffer => "grib_data_buff",
        }
    }

    pub fn grid_table(&self) -> &'static str {
        match self {
            Destination::Primary => "grid",
            Destination::Buffer => "grid_buff",
        }
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.data_table(), self.grid_table())
    }
}

/// Per-record metadata row, inserted on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub forecast_offset: u32,
    pub parameter: String,
    pub surface_type: String,
    pub surface_value: String,
    pub grid: String,
}

impl GridRow {
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(GridRow {
            id: record.id,
            timestamp: record.timestamp,
            forecast_offset: record.forecast_offset,
            parameter: record.parameter.clone(),
            surface_type: record.surface_type.clone(),
            surface_value: record.surface_value.clone(),
            grid: serde_json::to_string(&record.grid)?,
        })
    }
}

/// One bounded slice of a record's values. `chunk_index` is the offset of
/// the first value in the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkRow {
    pub id: Uuid,
    pub data: Vec<f64>,
    pub data_int: Vec<i64>,
    pub chunk_index: usize,
}

impl ChunkRow {
    /// Splits both value columns of `record` into rows of at most
    /// `chunk_size` values.
    pub fn split(record: &Record, chunk_size: usize) -> Vec<ChunkRow> {
        let chunk_size = chunk_size.max(1);
        record
            .data
            .chunks(chunk_size)
            .zip(record.data_int.chunks(chunk_size))
            .enumerate()
            .map(|(i, (data, data_int))| ChunkRow {
                id: record.id,
                data: data.to_vec(),
                data_int: data_int.to_vec(),
                chunk_index: i * chunk_size,
            })
            .collect()
    }
}

/// A persistence backend. Connections are short-lived: the export stage
/// drops and re-acquires one after every flushed batch.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn ensure_schema(&self) -> Result<()>;

    async fn connect(&self) -> Result<Box<dyn SinkConnection>>;
}

#[async_trait]
pub trait SinkConnection: Send {
    async fn has_already_ingested(&mut self, fingerprint: &Fingerprint) -> Result<bool>;

    /// Not atomic with [`SinkConnection::has_already_ingested`]; two callers may
    /// both register the same fingerprint.
    async fn record_ingested(&mut self, fingerprint: &Fingerprint) -> Result<()>;

    async fn ingested_count(&mut self) -> Result<u64>;

    async fn insert_row(&mut self, table: &str, row: &GridRow) -> Result<()>;

    async fn insert_batch(&mut self, table: &str, rows: &[ChunkRow]) -> Result<()>;
}
