use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures that stop ingestion as a whole.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("project root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("invalid ingest configuration: {0}")]
    Config(String),

    #[error("invalid glob `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("parser setup failed: {0}")]
    ParserSetup(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single file that could not be parsed. The file is still represented,
/// as an opaque unit.
#[derive(Debug, Clone, Error)]
#[error("parse failure in {path}: {reason}")]
pub struct ParseFailure {
    pub path: PathBuf,
    pub reason: String,
}
