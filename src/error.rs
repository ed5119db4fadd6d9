//! Fatal error taxonomy for an aggregation run.
//!
//! Every variant aborts the run. Nothing is retried and nothing already
//! written is cleaned up.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, parsing, or writing result tables.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A file matched the naming convention but carries no `_######` tract id.
    #[error("malformed result filename (expected <subject>_<6 digits>...): {}", .path.display())]
    MalformedFilename { path: PathBuf },

    /// The JSON document lacks an expected key path.
    #[error("missing field `{field}` in {}", .path.display())]
    MissingField { path: PathBuf, field: String },

    /// The key path exists but does not hold an integer.
    #[error("field `{field}` in {} is not an integer", .path.display())]
    InvalidField { path: PathBuf, field: String },

    #[error("invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write table {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StatsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatsError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_field(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        StatsError::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }
}
