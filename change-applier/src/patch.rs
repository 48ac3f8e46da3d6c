//! Dry-run output: one patch file with every retained change.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::classify::ResultsClassification;
use crate::diff;
use crate::errors::{ApplyError, Result};

pub const PATCH_DIR: &str = "target/rewrite";
pub const PATCH_FILE: &str = "rewrite.patch";

pub fn patch_path(root: &Path) -> PathBuf {
    root.join(PATCH_DIR).join(PATCH_FILE)
}

/// Concatenated diffs in patch order.
pub fn render_patch(classification: &ResultsClassification) -> String {
    classification.in_patch_order().map(diff::render).collect()
}

/// Writes `<root>/target/rewrite/rewrite.patch` through a temp file in the
/// same directory, then renames it into place. Returns `None` without
/// touching the filesystem when there is nothing to report.
#[instrument(skip_all, fields(results = classification.len()))]
pub fn emit_patch(root: &Path, classification: &ResultsClassification) -> Result<Option<PathBuf>> {
    if classification.is_empty() {
        info!("patch: no changes, nothing written");
        return Ok(None);
    }
    let path = patch_path(root);
    let dir = root.join(PATCH_DIR);
    let fail = |source| ApplyError::PatchWriteFailure {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(&dir).map_err(fail)?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(fail)?;
    tmp.write_all(render_patch(classification).as_bytes())
        .map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(&path).map_err(|e| fail(e.error))?;

    info!("patch: {} change(s) written to {}", classification.len(), path.display());
    Ok(Some(path))
}
