use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::sink::FingerprintKind;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
  #[error("LoadError: {0}")]
  Load(#[from] confy::ConfyError),

  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// What the decode workers produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
  /// Batched export of records to the sink
  Sink,
  /// One JSON file per record
  Json,
  /// One JSON file per full decoded message
  JsonSections,
}

impl Default for OutputMode {
  fn default() -> Self {
    OutputMode::Sink
  }
}

/// How decode workers share the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Distribution {
  /// Every worker walks the whole list; the admission gate filters duplicates
  FullScan,
  /// Workers claim files from a shared cursor, each file is opened once
  Claimed,
}

impl Default for Distribution {
  fn default() -> Self {
    Distribution::FullScan
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
  pub source_dir: String,
  pub save_dir: Option<String>,
  pub output: OutputMode,
  pub fingerprint: FingerprintKind,
  pub decode_workers: usize,
  pub distribution: Distribution,
  pub export: ExportConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      source_dir: String::new(),
      save_dir: None,
      output: OutputMode::default(),
      fingerprint: FingerprintKind::default(),
      decode_workers: 1,
      distribution: Distribution::default(),
      export: ExportConfig::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
  /// Values per chunk row
  pub chunk_size: usize,
  /// Chunk rows per flushed batch
  pub batch_rows: usize,
  /// Ingested files after which every batch goes to the buffer tables
  pub file_threshold: u64,
  pub flush_retries: u32,
  pub flush_backoff_ms: u64,
  pub queue_capacity: usize,
  pub message_queue_capacity: usize,
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      chunk_size: 1600,
      batch_rows: 50000,
      file_threshold: 42,
      flush_retries: 5,
      flush_backoff_ms: 200,
      queue_capacity: 10,
      message_queue_capacity: 20,
    }
  }
}

/// Upper bound on export workers, and so on concurrent sink connections.
const MAX_EXPORT_WORKERS: usize = 5;

impl Config {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let config: Config = confy::load_path(path)?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.source_dir.trim().is_empty() {
      return Err(ConfigError::Invalid(String::from("sourceDir is required")));
    }
    if self.decode_workers == 0 {
      return Err(ConfigError::Invalid(String::from("decodeWorkers must be at least 1")));
    }
    if self.output != OutputMode::Sink && self.save_dir.as_deref().map_or(true, |d| d.trim().is_empty()) {
      return Err(ConfigError::Invalid(format!("saveDir is required for {:?} output", self.output)));
    }

    let export = &self.export;
    for (name, value) in [
      ("chunkSize", export.chunk_size),
      ("batchRows", export.batch_rows),
      ("queueCapacity", export.queue_capacity),
      ("messageQueueCapacity", export.message_queue_capacity),
    ] {
      if value == 0 {
        return Err(ConfigError::Invalid(format!("export.{} must be at least 1", name)));
      }
    }

    Ok(())
  }

  pub fn source_dir(&self) -> PathBuf {
    PathBuf::from(&self.source_dir)
  }

  pub fn save_dir(&self) -> Option<PathBuf> {
    self.save_dir.as_ref().map(PathBuf::from)
  }

  /// A third of the spare cores, between 1 and 5, plus one for JSON output.
  pub fn export_workers(&self) -> usize {
    let workers = (num_cpus::get().saturating_sub(1) / 3).clamp(1, MAX_EXPORT_WORKERS);
    match self.output {
      OutputMode::Sink => workers,
      OutputMode::Json | OutputMode::JsonSections => workers + 1,
    }
  }
}
