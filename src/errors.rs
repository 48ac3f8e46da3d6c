//! Unified error type for a run.
//!
//! Everything here is fatal: the binary maps it to exit code 1. Per-file and
//! per-coordinate problems never reach this type; they are pooled by the
//! stage that hit them and logged.

use artifact_resolver::{DescriptorError, ResolveError};
use change_applier::ApplyError;
use rule_engine::{FieldConfigError, RuleError};
use source_ingest::IngestError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error("cannot set up artifact transport: {0}")]
    Transport(#[from] ResolveError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<FieldConfigError> for RunnerError {
    fn from(e: FieldConfigError) -> Self {
        RunnerError::Rule(RuleError::FieldConfiguration(e))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("rules file {0} does not exist")]
    MissingRulesFile(std::path::PathBuf),
}
