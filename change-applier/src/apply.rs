//! In-place write-back of a classification.
//!
//! Per-file failures never stop the pass. They are pooled into
//! [`ApplySummary::failures`] and reported once it completes.

use std::io;
use std::path::{Path, PathBuf};

use artifact_resolver::ArtifactFetcher;
use rule_engine::EditResult;
use source_ingest::model::{FileAttributes, Payload, SourceUnit};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::classify::ResultsClassification;
use crate::errors::WriteFailure;

#[derive(Debug, Default)]
pub struct ApplySummary {
    pub written: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Opaque afters; their content was never loaded.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<WriteFailure>,
}

pub struct ChangeApplier<'a, F> {
    root: PathBuf,
    fetcher: &'a F,
}

impl<'a, F: ArtifactFetcher> ChangeApplier<'a, F> {
    /// `fetcher` streams remote payloads at write time.
    pub fn new(root: impl Into<PathBuf>, fetcher: &'a F) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    #[instrument(skip_all, fields(results = classification.len()))]
    pub async fn apply_changes(&self, classification: &ResultsClassification) -> ApplySummary {
        let mut summary = ApplySummary::default();

        for result in &classification.created {
            self.write_after(result, &mut summary).await;
        }
        for result in &classification.deleted {
            if let Some(before) = &result.before {
                self.remove(before.path(), &mut summary).await;
            }
        }
        for result in &classification.moved {
            if self.write_after(result, &mut summary).await {
                if let Some(before) = &result.before {
                    self.remove(before.path(), &mut summary).await;
                }
            }
        }
        for result in &classification.modified {
            self.write_after(result, &mut summary).await;
        }

        info!(
            "apply: {} written, {} deleted, {} skipped, {} failed",
            summary.written.len(),
            summary.deleted.len(),
            summary.skipped.len(),
            summary.failures.len()
        );
        for failure in &summary.failures {
            warn!("apply: {failure}");
        }
        summary
    }

    /// Returns whether the after unit is now on disk.
    async fn write_after(&self, result: &EditResult, summary: &mut ApplySummary) -> bool {
        let Some(unit) = &result.after else {
            return false;
        };
        if unit.is_opaque() {
            debug!("apply: {} is opaque, not written", unit.path().display());
            summary.skipped.push(unit.path().to_path_buf());
            return false;
        }
        match self.write_unit(unit).await {
            Ok(()) => {
                summary.written.push(unit.path().to_path_buf());
                true
            }
            Err(reason) => {
                summary.failures.push(WriteFailure {
                    path: unit.path().to_path_buf(),
                    reason,
                });
                false
            }
        }
    }

    /// Stages the payload in a sibling temp file and renames it over the
    /// target, so a failed fetch or write leaves the old bytes in place.
    async fn write_unit(&self, unit: &SourceUnit) -> Result<(), String> {
        let path = self.root.join(unit.path());
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;

        let staged = NamedTempFile::new_in(&parent).map_err(|e| e.to_string())?;
        let handle = staged.as_file().try_clone().map_err(|e| e.to_string())?;
        let mut file = fs::File::from_std(handle);
        match unit.payload() {
            Payload::Text { text } => {
                let bytes = unit.charset().unwrap_or_default().encode(text);
                file.write_all(&bytes).await.map_err(|e| e.to_string())?;
            }
            Payload::Bytes { bytes } => {
                file.write_all(bytes).await.map_err(|e| e.to_string())?;
            }
            Payload::Remote { uri } => {
                let copied = self
                    .fetcher
                    .copy_to(uri, &mut file)
                    .await
                    .map_err(|e| e.to_string())?;
                debug!("apply: {copied} byte(s) from {uri}");
            }
            Payload::Opaque { .. } => return Err("opaque content cannot be written".into()),
        }
        file.flush().await.map_err(|e| e.to_string())?;
        file.sync_all().await.map_err(|e| e.to_string())?;
        drop(file);

        // the temp file is created private; keep the target's mode instead
        let perms = match fs::metadata(&path).await {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => fresh_permissions(),
        };
        if let Some(perms) = perms {
            fs::set_permissions(staged.path(), perms)
                .await
                .map_err(|e| format!("cannot set permissions: {e}"))?;
        }
        if let Some(attributes) = unit.attributes() {
            set_attributes(staged.path(), attributes)
                .await
                .map_err(|e| format!("cannot set permissions: {e}"))?;
        }
        staged.persist(&path).map_err(|e| e.error.to_string())?;
        Ok(())
    }

    async fn remove(&self, rel: &Path, summary: &mut ApplySummary) {
        match fs::remove_file(self.root.join(rel)).await {
            Ok(()) => summary.deleted.push(rel.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("apply: {} already gone", rel.display());
                summary.deleted.push(rel.to_path_buf());
            }
            Err(e) => summary.failures.push(WriteFailure {
                path: rel.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(unix)]
fn fresh_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn fresh_permissions() -> Option<std::fs::Permissions> {
    None
}

#[cfg(unix)]
async fn set_attributes(path: &Path, attributes: FileAttributes) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).await?.permissions();
    let mut mode = perms.mode();
    for (bit, on) in [
        (0o400, attributes.readable),
        (0o200, attributes.writable),
        (0o100, attributes.executable),
    ] {
        if on {
            mode |= bit;
        } else {
            mode &= !bit;
        }
    }
    perms.set_mode(mode);
    fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn set_attributes(path: &Path, attributes: FileAttributes) -> io::Result<()> {
    let mut perms = fs::metadata(path).await?.permissions();
    perms.set_readonly(!attributes.writable);
    fs::set_permissions(path, perms).await
}
