use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while building a driver report.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The movement report could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader failed on the header or on the underlying stream.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document (config file or report) could not be (de)serialised.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the scoring crates.
pub type Result<T> = std::result::Result<T, ScoreError>;
