//! Error types for normalizing and querying JSON run logs.

use std::path::PathBuf;

use crate::types::RecordId;

/// A persisted line that cannot become a [`LogRecord`](crate::LogRecord).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("line is valid JSON but not an object")]
    NotAnObject,

    #[error("record has no `timestamp` field")]
    MissingTimestamp,

    #[error("unparsable timestamp `{0}` (expected ISO-8601 with a `Z` suffix)")]
    InvalidTimestamp(String),
}

/// Failures of [`LogStore`](crate::LogStore) loading and lookups.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to read log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a JSON run log (expected a `.json.log` file): {0}")]
    InvalidPath(PathBuf),

    #[error("no log file has been loaded yet")]
    NotLoaded,

    #[error("no record with id {id} ({len} records loaded)")]
    RecordNotFound { id: RecordId, len: usize },

    #[error("record ids must be non-negative integers, got {0}")]
    InvalidId(String),
}
