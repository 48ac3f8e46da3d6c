use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Per-coordinate resolution failures.
///
/// None of these abort a transitive walk; they are collected next to the
/// partial classpath so the caller can report them.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid coordinate `{0}`: expected group:name[:type[:classifier]]:version")]
    InvalidCoordinate(String),

    #[error("artifact not found: {coordinate} (tried {tried} repositories)")]
    ArtifactNotFound { coordinate: String, tried: usize },

    #[error("artifact corrupt: {coordinate}: {reason}")]
    ArtifactCorrupt { coordinate: String, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = e.status() {
            format!("unexpected status {status}")
        } else {
            e.to_string()
        };
        ResolveError::Http { url, message }
    }
}

/// Failures computing an effective build model. Always fatal for the root
/// descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid build descriptor {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    #[error("parent {parent} of {path} could not be located: {reason}")]
    MissingParent {
        parent: String,
        path: PathBuf,
        reason: String,
    },
}

impl DescriptorError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DescriptorInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
