//! Run configuration.
//!
//! Layers, lowest first: [`RunConfig::default`], `REWRITE_*` environment
//! variables, then command-line flags. [`RunConfig::validate`] runs once all
//! layers are applied.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use source_ingest::IngestConfig;

use crate::errors::ConfigError;

pub const ENV_CONFIG_LOCATION: &str = "REWRITE_CONFIG_LOCATION";
pub const ENV_SIZE_THRESHOLD_MB: &str = "REWRITE_SIZE_THRESHOLD_MB";
pub const ENV_PLAIN_TEXT_MASKS: &str = "REWRITE_PLAIN_TEXT_MASKS";
pub const ENV_EXCLUSIONS: &str = "REWRITE_EXCLUSIONS";

/// Project rules file looked up in the project root.
pub const DEFAULT_RULES_FILE: &str = "rewrite.yml";

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub project_root: PathBuf,
    /// Rule ids to run, in order. Empty means every rule of the project
    /// rules file.
    pub rules: Vec<String>,
    /// Raw `key=value` overrides for the selected rule.
    pub options: Vec<String>,
    /// Extension packages: paths or coordinates.
    pub extensions: Vec<String>,
    /// Project rules file; `<project_root>/rewrite.yml` when unset.
    pub config_location: Option<PathBuf>,
    pub extend_host_registry: bool,
    /// Write a patch instead of changing files.
    pub dry_run: bool,
    pub ingest: IngestConfig,
    pub resolver: ResolverSettings,
    pub profiles: Vec<String>,
    pub user_properties: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            rules: Vec::new(),
            options: Vec::new(),
            extensions: Vec::new(),
            config_location: None,
            extend_host_registry: true,
            dry_run: true,
            ingest: IngestConfig::default(),
            resolver: ResolverSettings::default(),
            profiles: Vec::new(),
            user_properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Local artifact cache; `~/.m2/repository` when unset.
    pub local_repository: Option<PathBuf>,
    /// Remote base urls tried in order. Empty means the defaults.
    pub remotes: Vec<String>,
    pub concurrency: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            local_repository: None,
            remotes: Vec::new(),
            concurrency: 8,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

impl ResolverSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RunConfig {
    pub fn rules_file(&self) -> PathBuf {
        self.config_location
            .clone()
            .unwrap_or_else(|| self.project_root.join(DEFAULT_RULES_FILE))
    }

    pub fn with_size_threshold_mb(mut self, mb: u64) -> Self {
        self.ingest.limits.size_threshold_bytes = mb.saturating_mul(MB);
        self
    }

    /// Applies `REWRITE_*` variables from the process environment.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Applies `REWRITE_*` variables read through `lookup`. Unset and blank
    /// variables leave the current value alone.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_CONFIG_LOCATION) {
            self.config_location = Some(PathBuf::from(v.trim()));
        }
        if let Some(v) = get(ENV_SIZE_THRESHOLD_MB) {
            let mb = v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_SIZE_THRESHOLD_MB,
                reason: "expected a whole number of megabytes",
            })?;
            self = self.with_size_threshold_mb(mb);
        }
        if let Some(v) = get(ENV_PLAIN_TEXT_MASKS) {
            self.ingest.filters.plain_text_masks = split_list(&v);
        }
        if let Some(v) = get(ENV_EXCLUSIONS) {
            self.ingest.filters.exclusions = split_list(&v);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.resolver.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "`resolver.concurrency` must be greater than 0".into(),
            ));
        }
        for url in &self.resolver.remotes {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "remote repository `{url}` must start with http:// or https://"
                )));
            }
        }
        if !self.options.is_empty() && self.rules.len() != 1 {
            return Err(ConfigError::Invalid(format!(
                "rule options need exactly one selected rule, got {}",
                self.rules.len()
            )));
        }
        Ok(())
    }
}

/// Comma separated, blanks dropped.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
