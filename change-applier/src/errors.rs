use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApplyError>;

/// Failures that stop the output stage.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("cannot write patch {path}: {source}")]
    PatchWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One file that could not be written or removed. Pooled, never fatal.
#[derive(Debug, Clone, Error)]
#[error("write failure at {path}: {reason}")]
pub struct WriteFailure {
    pub path: PathBuf,
    pub reason: String,
}
