use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use rewrite_runner::RunConfig;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve a project's classpath, ingest its sources and run rewrite rules
/// over them.
#[derive(Debug, Parser)]
#[command(name = "rewrite-runner", version)]
struct Cli {
    /// Project root; `pom.xml` is read from here when present.
    project_root: PathBuf,

    /// Rule id to run; repeatable. Defaults to every rule in the rules file.
    #[arg(short = 'r', long = "rule")]
    rules: Vec<String>,

    /// `key=value` options for the selected rule.
    #[arg(short = 'o', long = "option", value_delimiter = ',')]
    options: Vec<String>,

    /// Extension packages: jar paths or group:name:version coordinates.
    #[arg(long = "jar", value_delimiter = ',')]
    jars: Vec<String>,

    /// Rules file, `<PROJECT_ROOT>/rewrite.yml` by default.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Globs of files left out of ingestion.
    #[arg(long, value_delimiter = ',')]
    exclusions: Vec<String>,

    /// Globs of files ingested as plain text; replaces the defaults.
    #[arg(long, value_delimiter = ',')]
    plain_text_masks: Vec<String>,

    /// Files above this size are kept opaque.
    #[arg(long)]
    size_threshold_mb: Option<u64>,

    /// Write changes into the project instead of emitting a patch.
    #[arg(long)]
    apply: bool,

    #[arg(long)]
    local_repository: Option<PathBuf>,

    /// Remote repository base urls, tried in order.
    #[arg(long, value_delimiter = ',')]
    remote_repository: Vec<String>,

    /// Build profiles to activate; `!id` deactivates.
    #[arg(long, value_delimiter = ',')]
    profile: Vec<String>,

    /// Build property, `-Dkey=value`.
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    define: Vec<String>,

    /// Report extension rules without making them selectable.
    #[arg(long)]
    no_extend_host_registry: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut cfg = RunConfig::default()
            .with_process_env()
            .context("reading REWRITE_* environment")?;

        cfg.project_root = self.project_root;
        cfg.rules = self.rules;
        cfg.options = self.options;
        cfg.extensions = self.jars;
        cfg.dry_run = !self.apply;
        cfg.extend_host_registry = !self.no_extend_host_registry;
        cfg.profiles = self.profile;
        cfg.resolver.local_repository = self.local_repository;
        cfg.resolver.remotes = self.remote_repository;
        if self.config.is_some() {
            cfg.config_location = self.config;
        }
        if !self.exclusions.is_empty() {
            cfg.ingest.filters.exclusions = self.exclusions;
        }
        if !self.plain_text_masks.is_empty() {
            cfg.ingest.filters.plain_text_masks = self.plain_text_masks;
        }
        if let Some(mb) = self.size_threshold_mb {
            cfg = cfg.with_size_threshold_mb(mb);
        }
        cfg.user_properties = parse_properties(&self.define)?;
        Ok(cfg)
    }
}

fn parse_properties(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|d| {
            let (k, v) = d.split_once('=').unwrap_or((d.as_str(), "true"));
            if k.trim().is_empty() {
                return Err(anyhow!("malformed property `-D{d}`"));
            }
            Ok((k.trim().to_string(), v.to_string()))
        })
        .collect()
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = cli.into_config()?;
    let report = rewrite_runner::execute(&cfg).await?;

    if let Some(patch) = &report.patch {
        info!("main: patch written to {}", patch.display());
    }
    if let Some(applied) = &report.applied {
        if !applied.failures.is_empty() {
            error!("main: {} file(s) could not be written", applied.failures.len());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("main: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "rewrite-runner",
            "/work/app",
            "-r",
            "rewrite.text.FindAndReplace",
            "-o",
            "find=foo,regex=true",
            "--apply",
            "--size-threshold-mb",
            "3",
            "-Drevision=1.2",
            "-Dskip",
        ]);
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.options, ["find=foo", "regex=true"]);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.ingest.limits.size_threshold_bytes, 3 * 1024 * 1024);
        assert_eq!(cfg.user_properties["revision"], "1.2");
        assert_eq!(cfg.user_properties["skip"], "true");
    }

    #[test]
    fn empty_property_names_are_rejected() {
        assert!(parse_properties(&["=x".to_string()]).is_err());
    }
}
