//! Batch source rewriting for Maven-style projects.
//!
//! [`pipeline::execute`] resolves the project's classpath, ingests its files,
//! runs the selected rules and either emits a patch or writes the changes
//! back.

pub mod config;
pub mod errors;
pub mod pipeline;

pub use config::RunConfig;
pub use errors::{ConfigError, Result, RunnerError};
pub use pipeline::{RunReport, execute, execute_with};
