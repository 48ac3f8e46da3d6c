//! Configuration data structures for source ingestion.
//!
//! Groups:
//! - [`IngestConfig`]: top-level container
//! - [`Filters`]: exclusions and plain-text masks
//! - [`Limits`]: size threshold for opaque placeholders
//!
//! All structs are `serde`-friendly so they can be loaded from YAML/JSON.

use anyhow::{Result, anyhow};
use globset::Glob;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SIZE_THRESHOLD_MB: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub filters: Filters,
    pub limits: Limits,
}

impl IngestConfig {
    /// Validate config sanity (no degenerate values, every glob compiles).
    pub fn validate(&self) -> Result<()> {
        if self.limits.size_threshold_bytes == 0 {
            return Err(anyhow!("`size_threshold_bytes` must be greater than 0"));
        }
        for pattern in self
            .filters
            .exclusions
            .iter()
            .chain(&self.filters.plain_text_masks)
        {
            Glob::new(pattern).map_err(|e| anyhow!("invalid glob `{pattern}`: {e}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Globs matched against project-relative paths; matches are not ingested.
    pub exclusions: Vec<String>,
    /// Globs selecting files for the plain-text group.
    pub plain_text_masks: Vec<String>,
    /// Directory names never descended into (hidden directories are always
    /// skipped).
    pub skip_dirs: Vec<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            exclusions: Vec::new(),
            plain_text_masks: default_plain_text_masks(),
            skip_dirs: vec!["target".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Files above this size become opaque placeholders without being read.
    pub size_threshold_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            size_threshold_bytes: DEFAULT_SIZE_THRESHOLD_MB * 1024 * 1024,
        }
    }
}

pub fn default_plain_text_masks() -> Vec<String> {
    [
        "**/*.adoc",
        "**/*.bash",
        "**/*.bat",
        "**/CODEOWNERS",
        "**/*.css",
        "**/*.config",
        "**/[dD]ockerfile*",
        "**/*.[dD]ockerfile",
        "**/*.env",
        "**/.gitattributes",
        "**/.gitignore",
        "**/*.htm*",
        "**/gradlew",
        "**/.java-version",
        "**/*.jelly",
        "**/*.jsp",
        "**/*.ksh",
        "**/*.lock",
        "**/lombok.config",
        "**/[mM]akefile",
        "**/*.md",
        "**/*.mf",
        "**/META-INF/services/**",
        "**/META-INF/spring/**",
        "**/META-INF/spring.factories",
        "**/mvnw",
        "**/mvnw.cmd",
        "**/*.qute.java",
        "**/.sdkmanrc",
        "**/*.sh",
        "**/*.sql",
        "**/*.svg",
        "**/*.tsx",
        "**/*.txt",
        "**/*.py",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = IngestConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.limits.size_threshold_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn bad_globs_and_zero_threshold_are_rejected() {
        let mut cfg = IngestConfig::default();
        cfg.filters.exclusions.push("src/[".into());
        assert!(cfg.validate().is_err());

        let mut cfg = IngestConfig::default();
        cfg.limits.size_threshold_bytes = 0;
        assert!(cfg.validate().is_err());
    }
}
