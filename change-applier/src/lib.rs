//! Output stage: classify edit results, then either emit a patch or write
//! the changes back into the project.

pub mod apply;
pub mod classify;
pub mod diff;
pub mod errors;
pub mod patch;
pub mod report;

pub use apply::{ApplySummary, ChangeApplier};
pub use classify::{ResultsClassification, classify};
pub use errors::{ApplyError, WriteFailure};
pub use patch::{emit_patch, patch_path, render_patch};
pub use report::{format_duration, log_report};
