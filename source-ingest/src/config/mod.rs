//! Ingestion configuration.

pub mod model;

pub use model::{
    DEFAULT_SIZE_THRESHOLD_MB, Filters, IngestConfig, Limits, default_plain_text_masks,
};
