//! Source ingestion: walks a project tree, classifies every file, parses it
//! into a [`model::SourceUnit`] and stamps the run's provenance.
//!
//! Entry point: [`ingest::ingest`].

pub mod config;
pub mod core;
pub mod errors;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod provenance;
pub mod type_index;

pub use config::model::IngestConfig;
pub use errors::{IngestError, ParseFailure};
pub use ingest::{IngestOutput, IngestStats, ingest};
pub use provenance::ProvenanceBundle;
pub use type_index::TypeIndex;
