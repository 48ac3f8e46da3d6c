//! Normalization helpers for paths and glob handling.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{IngestError, Result};

/// Replace OS-specific separators with `/`.
///
/// # Example
/// ```
/// use source_ingest::core::normalize::to_unix_sep;
///
/// assert_eq!(to_unix_sep(r"src\main\App.java"), "src/main/App.java");
/// ```
pub fn to_unix_sep<S: AsRef<str>>(s: S) -> String {
    s.as_ref().replace('\\', "/")
}

/// Project-relative path with `/` separators; `path` itself when it is not
/// under `root`.
pub fn relative_unix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    to_unix_sep(rel.to_string_lossy())
}

/// Build a [`GlobSet`] from patterns. Empty input yields `None`.
pub fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| IngestError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|source| IngestError::Glob {
        pattern: patterns.join(","),
        source,
    })?;
    Ok(Some(set))
}

pub fn matches_any(rel: &str, globs: Option<&GlobSet>) -> bool {
    globs.is_some_and(|g| g.is_match(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_paths_are_unix_style() {
        let root = PathBuf::from("/work/project");
        assert_eq!(
            relative_unix(&root, &root.join("src").join("A.java")),
            "src/A.java"
        );
    }

    #[test]
    fn double_star_masks_match_top_level_files() {
        let set = build_globset(&["**/*.md".to_string()]).unwrap();
        assert!(matches_any("README.md", set.as_ref()));
        assert!(matches_any("docs/guide.md", set.as_ref()));
        assert!(!matches_any("docs/guide.mdx", set.as_ref()));
        assert!(!matches_any("x.md", None));
    }
}
