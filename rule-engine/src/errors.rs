use std::path::PathBuf;

use thiserror::Error;

use crate::fields::FieldKind;

pub type Result<T> = std::result::Result<T, RuleError>;

#[derive(Debug, Error)]
pub enum RuleError {
    /// No visible registry layer defines the requested id.
    #[error("rule selection failed: no rule `{id}` in any loaded registry")]
    SelectionFailure { id: String },

    #[error(transparent)]
    FieldConfiguration(#[from] FieldConfigError),

    #[error("invalid rule definition in {origin}: {reason}")]
    Definition { origin: String, reason: String },

    #[error("rule `{id}` includes itself through {chain}")]
    Cycle { id: String, chain: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected `key=value` overrides. Always fatal for the rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldConfigError {
    #[error("unknown options for rule `{rule}`: {}", keys.join(", "))]
    UnknownFields { rule: String, keys: Vec<String> },

    #[error("option `{field}` of rule `{rule}` expects {expected}, got `{value}`")]
    NotCoercible {
        rule: String,
        field: String,
        value: String,
        expected: FieldKind,
    },

    #[error("rules containing other rules cannot be configured with options: `{rule}`")]
    Composite { rule: String },

    #[error("malformed option `{0}`, expected key=value")]
    MalformedOption(String),
}
