use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

// -----------------------------------------------------------------------------
// Document (XML) errors
// -----------------------------------------------------------------------------
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed XML document: {0}")]
    Malformed(String),

    #[error("failed to serialize document: {0}")]
    Serialization(String),

    #[error("invalid number '{value}' in <{field}>")]
    InvalidNumber { field: &'static str, value: String },
}

// -----------------------------------------------------------------------------
// Date errors
// -----------------------------------------------------------------------------
#[derive(Debug, Error, PartialEq)]
pub enum DateError {
    #[error("no date found in '{0}'")]
    NotFound(String),

    #[error("date range starts on {start} but ends on {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

// -----------------------------------------------------------------------------
// Store errors
// -----------------------------------------------------------------------------
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file {} does not exist, load a configuration first", .0.display())]
    NotInitialized(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("data file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("every numeric resource id up to {} is taken", u64::MAX)]
    ResourceIdsExhausted,

    #[error(transparent)]
    Document(#[from] DocumentError),
}
