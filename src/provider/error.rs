use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

#[cfg(feature = "mzml")]
use crate::mzml::MzMLError;

/// Errors raised while reading a raw run
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The run could not be opened or read
    #[error("Failed to read run {path}: {source}")]
    Io {
        /// Path of the run
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The mzML document is malformed
    #[cfg(feature = "mzml")]
    #[error("Failed to parse mzML run {path}: {source}")]
    MzML {
        /// Path of the run
        path: PathBuf,
        /// Underlying parser error
        #[source]
        source: MzMLError,
    },

    /// No run with this path is known to the source
    #[error("Run not found: {0}")]
    RunNotFound(PathBuf),

    /// The source cannot read runs of this format
    #[error("Unsupported run format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Errors raised by the on-disk table cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem error
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet encoding error while writing
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Arrow conversion error while writing
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// A cache file exists but cannot be decoded
    #[error("Corrupt cache file {path}: {reason}")]
    Corrupt {
        /// Path of the offending file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },
}
