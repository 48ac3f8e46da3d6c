//! One run, stage by stage:
//!
//! 1. rule registry: host built-ins, the project rules file, extensions
//! 2. rule selection and options (fatal, before any project file is read)
//! 3. build descriptor and classpath
//! 4. ingestion
//! 5. rule execution
//! 6. classification, then patch (dry run) or write-back

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use artifact_resolver::{
    ArtifactFetcher, ArtifactResolver, ClasspathAssembler, DescriptorLoader, EffectiveModel,
    HttpFetcher, LoadOptions, LocalRepository, RemoteRepository, ResolvedClasspath,
    ResolverConfig,
};
use change_applier::{
    ApplySummary, ChangeApplier, ResultsClassification, classify, emit_patch, log_report,
};
use rule_engine::runner::RuleFailure;
use rule_engine::{
    ExtensionLoader, LoadedExtensions, RegistryLayer, Rule, RuleError, RuleRegistry,
    parse_definitions, parse_options, validate_all,
};
use source_ingest::{ProvenanceBundle, ingest};
use tracing::{info, instrument, warn};

use crate::config::RunConfig;
use crate::errors::{ConfigError, Result, RunnerError};

pub const PROJECT_LAYER: &str = "project";
const BUILD_DESCRIPTOR: &str = "pom.xml";

#[derive(Debug, Default)]
pub struct RunReport {
    pub classification: ResultsClassification,
    /// Written patch, dry run only.
    pub patch: Option<PathBuf>,
    /// Write-back summary, apply mode only.
    pub applied: Option<ApplySummary>,
    pub extensions: LoadedExtensions,
    pub rule_failures: Vec<RuleFailure>,
    pub parse_failures: usize,
    pub unresolved_dependencies: usize,
}

/// Runs with the HTTP transport.
pub async fn execute(cfg: &RunConfig) -> Result<RunReport> {
    let fetcher = HttpFetcher::new(
        cfg.resolver.connect_timeout(),
        cfg.resolver.request_timeout(),
    )?;
    execute_with(cfg, fetcher).await
}

#[instrument(skip_all, fields(root = %cfg.project_root.display(), dry_run = cfg.dry_run))]
pub async fn execute_with<F: ArtifactFetcher>(cfg: &RunConfig, fetcher: F) -> Result<RunReport> {
    cfg.validate()?;
    let root = dunce::canonicalize(&cfg.project_root)
        .map_err(|_| source_ingest::IngestError::RootMissing(cfg.project_root.clone()))?;
    let env: BTreeMap<String, String> = std::env::vars().collect();

    let resolver = ArtifactResolver::new(resolver_config(cfg), fetcher);
    let mut report = RunReport::default();

    // 1. registry
    let mut registry = RuleRegistry::with_builtins();
    if let Some(layer) = load_project_rules(cfg)? {
        registry.push_layer(layer);
    }
    report.extensions = ExtensionLoader::new(&resolver)
        .extend_host_registry(cfg.extend_host_registry)
        .load(&cfg.extensions, &mut registry)
        .await;

    // 2. selection
    let rules = select_rules(cfg, &registry)?;
    if rules.is_empty() {
        warn!("pipeline: no rules selected, nothing to do");
        return Ok(report);
    }

    // 3. descriptor and classpath
    let load_options = LoadOptions {
        profiles: cfg.profiles.clone(),
        user_properties: cfg.user_properties.clone(),
        env: env.clone(),
    };
    let model = load_model(&resolver, &load_options, &root).await?;
    let classpath = match &model {
        Some(m) => {
            let resolution = ClasspathAssembler::new(&resolver).assemble(m).await;
            for failure in &resolution.failures {
                warn!("pipeline: {} unresolved: {}", failure.coordinate, failure.error);
            }
            report.unresolved_dependencies = resolution.failures.len();
            resolution.classpath
        }
        None => ResolvedClasspath::default(),
    };
    info!("pipeline: classpath has {} entries", classpath.len());

    // 4. ingestion
    let provenance = ProvenanceBundle::collect(&root, model.as_ref(), &env);
    let ingest_root = root.clone();
    let ingest_cfg = cfg.ingest.clone();
    let output = tokio::task::spawn_blocking(move || {
        ingest(&ingest_root, &ingest_cfg, &classpath, &provenance)
    })
    .await??;
    report.parse_failures = output.failures.len();

    // 5. rules
    let units = output.units;
    let outcome = tokio::task::spawn_blocking(move || rule_engine::run(&rules, &units)).await?;
    report.rule_failures = outcome.failures;
    for failure in &report.rule_failures {
        warn!("pipeline: {} failed: {}", failure.rule, failure.reason);
    }

    // 6. output
    report.classification = classify(outcome.results);
    if cfg.dry_run {
        report.patch = emit_patch(&root, &report.classification)?;
    } else {
        let applier = ChangeApplier::new(&root, resolver.fetcher());
        report.applied = Some(applier.apply_changes(&report.classification).await);
    }
    log_report(&report.classification, cfg.dry_run);
    Ok(report)
}

fn resolver_config(cfg: &RunConfig) -> ResolverConfig {
    let remotes = if cfg.resolver.remotes.is_empty() {
        RemoteRepository::defaults()
    } else {
        cfg.resolver
            .remotes
            .iter()
            .enumerate()
            .map(|(i, url)| RemoteRepository::new(format!("remote-{i}"), url.as_str()))
            .collect()
    };
    ResolverConfig {
        local_repository: cfg
            .resolver
            .local_repository
            .clone()
            .unwrap_or_else(LocalRepository::default_location),
        remotes,
        concurrency: cfg.resolver.concurrency,
    }
}

/// An explicitly configured rules file must exist; the default one is
/// optional.
fn load_project_rules(cfg: &RunConfig) -> Result<Option<RegistryLayer>> {
    let path = cfg.rules_file();
    if !path.is_file() {
        if cfg.config_location.is_some() {
            return Err(ConfigError::MissingRulesFile(path).into());
        }
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|source| RuleError::Io {
        path: path.clone(),
        source,
    })?;
    let definitions = parse_definitions(&text, &path.display().to_string())?;
    info!(
        "pipeline: {} rule(s) from {}",
        definitions.len(),
        path.display()
    );
    Ok(Some(RegistryLayer::from_definitions(
        PROJECT_LAYER,
        definitions,
    )))
}

fn select_rules(cfg: &RunConfig, registry: &RuleRegistry) -> Result<Vec<Box<dyn Rule>>> {
    let options = parse_options(&cfg.options)?;
    let ids: Vec<String> = if cfg.rules.is_empty() {
        registry
            .layer(PROJECT_LAYER)
            .map(|l| l.ids().map(str::to_string).collect())
            .unwrap_or_default()
    } else {
        cfg.rules.clone()
    };

    let mut rules = Vec::with_capacity(ids.len());
    for id in &ids {
        let rule = registry.select(id, &options)?;
        for finding in validate_all(rule.as_ref()) {
            warn!("pipeline: validation: {finding}");
        }
        info!("pipeline: selected {}", rule.id());
        rules.push(rule);
    }
    Ok(rules)
}

/// A project without a build descriptor is ingested with an empty
/// classpath. An invalid descriptor is fatal.
async fn load_model<F: ArtifactFetcher>(
    resolver: &ArtifactResolver<F>,
    options: &LoadOptions,
    root: &Path,
) -> Result<Option<EffectiveModel>> {
    let pom = root.join(BUILD_DESCRIPTOR);
    if !pom.is_file() {
        warn!("pipeline: no {BUILD_DESCRIPTOR} in {}, using an empty classpath", root.display());
        return Ok(None);
    }
    let model = DescriptorLoader::new(resolver, options)
        .load(&pom)
        .await
        .map_err(RunnerError::from)?;
    Ok(Some(model))
}
