//! Project tree walk.
//!
//! Entries are visited in file-name order so discovery indices are stable
//! across runs. Build-output and hidden directories are pruned before
//! descending; exclusion globs apply to files and directories alike.

use std::fs;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::model::IngestConfig;
use crate::core::normalize::{build_globset, matches_any, relative_unix};
use crate::errors::{IngestError, Result};
use crate::model::FileAttributes;

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Position in walk order.
    pub index: usize,
    pub path: PathBuf,
    /// Project-relative, `/`-separated.
    pub rel: String,
    pub size: u64,
    pub attributes: FileAttributes,
}

pub fn discover(root: &Path, cfg: &IngestConfig) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        return Err(IngestError::RootMissing(root.to_path_buf()));
    }
    info!("fs_scan: start -> {}", root.display());

    let exclusions: Option<GlobSet> = build_globset(&cfg.filters.exclusions)?;
    let mut skipped_excluded = 0usize;
    let mut files = Vec::new();

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| keep_entry(e, &cfg.filters.skip_dirs));

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("fs_scan: walk error: {err}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let rel = relative_unix(root, entry.path());
        if matches_any(&rel, exclusions.as_ref()) {
            skipped_excluded += 1;
            debug!("fs_scan: excluded {rel}");
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let meta = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(err) => {
                warn!("fs_scan: metadata failed for {}: {err}", entry.path().display());
                continue;
            }
        };
        files.push(DiscoveredFile {
            index: files.len(),
            path: entry.path().to_path_buf(),
            rel,
            size: meta.len(),
            attributes: FileAttributes::from_metadata(&meta),
        });
    }

    info!(
        "fs_scan: done, total={} (excluded={})",
        files.len(),
        skipped_excluded
    );
    Ok(files)
}

/// Prune hidden directories and configured build-output directories. The
/// walk root itself is always kept.
fn keep_entry(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    match entry.file_name().to_str() {
        Some(name) => !(name.starts_with('.') || skip_dirs.iter().any(|d| d == name)),
        None => true,
    }
}
