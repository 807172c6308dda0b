use thiserror::Error;
use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use tokio::task::JoinError;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Malformed summary: {0}")]
    MalformedSummary(String),

    #[error("IO error: {0}")]
    IO(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("Object store error: {0}")]
    Store(String),

    #[error("General error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<ParquetError> for Error {
    fn from(err: ParquetError) -> Self {
        Error::Parquet(err.to_string())
    }
}

impl From<ArrowError> for Error {
    fn from(err: ArrowError) -> Self {
        Error::Arrow(err.to_string())
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}
