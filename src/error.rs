use crate::config::ConfigError;
use crate::grib;
use crate::sink::SinkError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("GribError: {0}")]
    GribError(#[from] grib::GribError),

    #[error("SinkError: {0}")]
    SinkError(#[from] SinkError),

    #[error("ConfigError: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JsonError: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JoinError: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    /// A queue consumer went away before its producers were done
    #[error("QueueClosed")]
    QueueClosed(),

    #[error("Cancelled")]
    Cancelled(),
}
