//! Build descriptor loading.
//!
//! Produces an [`EffectiveModel`] from a `pom.xml`:
//! - parent chain inheritance (local `relativePath` first, then the resolver);
//! - profile activation (explicit ids, `<property>` conditions, `activeByDefault`);
//! - `${...}` property substitution including `project.*` and `env.*`;
//! - dependency management, including `import`-scoped BOMs.
//!
//! The resulting dependency list carries no remaining placeholders.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::{debug, info, instrument, warn};

use crate::coordinate::{Coordinate, DependencyEdge, Exclusion, ModuleId, Scope};
use crate::errors::DescriptorError;
use crate::repository::{ArtifactFetcher, RemoteRepository};
use crate::resolver::ArtifactResolver;

type Result<T> = std::result::Result<T, DescriptorError>;

const MAX_IMPORT_DEPTH: usize = 8;
const MAX_INTERPOLATION_PASSES: usize = 8;

/// Inputs that influence profile activation and interpolation.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Profile ids to activate; a leading `!` deactivates instead.
    pub profiles: Vec<String>,
    /// `-Dkey=value` style properties. They win over model properties.
    pub user_properties: BTreeMap<String, String>,
    /// Environment, exposed as `env.NAME`.
    pub env: BTreeMap<String, String>,
}

impl LoadOptions {
    pub fn with_process_env(mut self) -> Self {
        self.env = std::env::vars().collect();
        self
    }

    fn explicitly_active(&self, id: &str) -> bool {
        self.profiles.iter().any(|p| p == id)
    }

    fn explicitly_inactive(&self, id: &str) -> bool {
        self.profiles
            .iter()
            .any(|p| p.strip_prefix('!').is_some_and(|p| p == id))
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.user_properties.get(name) {
            return Some(v);
        }
        name.strip_prefix("env.")
            .and_then(|n| self.env.get(n))
            .map(String::as_str)
    }
}

/// Managed version/scope/exclusions for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDependency {
    pub coordinate: Coordinate,
    pub scope: Option<Scope>,
    pub exclusions: Vec<Exclusion>,
}

pub type DependencyManagement = BTreeMap<ModuleId, ManagedDependency>;

#[derive(Debug, Clone, Default)]
pub struct EffectiveModel {
    pub path: PathBuf,
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub packaging: String,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyEdge>,
    pub dependency_management: DependencyManagement,
    pub repositories: Vec<RemoteRepository>,
    pub active_profiles: Vec<String>,
}

impl EffectiveModel {
    pub fn project_coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(
            self.group.clone()?,
            self.artifact.clone()?,
            self.version.clone()?,
        ))
    }

    /// Java release level from `maven.compiler.release|source|target`.
    pub fn java_release(&self) -> Option<&str> {
        ["maven.compiler.release", "maven.compiler.source", "maven.compiler.target"]
            .iter()
            .find_map(|k| self.properties.get(*k))
            .map(String::as_str)
    }
}

pub struct DescriptorLoader<'a, F> {
    resolver: &'a ArtifactResolver<F>,
    options: &'a LoadOptions,
}

impl<'a, F: ArtifactFetcher> DescriptorLoader<'a, F> {
    pub fn new(resolver: &'a ArtifactResolver<F>, options: &'a LoadOptions) -> Self {
        Self { resolver, options }
    }

    /// Load the project descriptor at `path` into its effective model.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn load(&self, path: &Path) -> Result<EffectiveModel> {
        let raw = read_pom(path)?;
        let chain = self.parent_chain(path, raw, true).await?;
        let model = self.build(chain, path, true, 0).await?;
        info!(
            "descriptor: {} dependencies, {} managed, profiles={:?}",
            model.dependencies.len(),
            model.dependency_management.len(),
            model.active_profiles
        );
        Ok(model)
    }

    /// Effective model of a repository artifact's `.pom`. Invalid dependency
    /// entries are skipped instead of failing the whole model.
    pub fn load_artifact<'b>(
        &'b self,
        coordinate: &'b Coordinate,
        depth: usize,
    ) -> BoxFuture<'b, Result<EffectiveModel>> {
        Box::pin(async move {
            let pom = coordinate.pom();
            let path = self
                .resolver
                .resolve(&pom)
                .await
                .map_err(|e| DescriptorError::invalid(pom.to_string(), e.to_string()))?;
            let raw = read_pom(&path)?;
            let chain = self.parent_chain(&path, raw, false).await?;
            self.build(chain, &path, false, depth).await
        })
    }

    async fn parent_chain(&self, path: &Path, raw: RawPom, local: bool) -> Result<Vec<LoadedPom>> {
        let mut chain = vec![LoadedPom {
            path: path.to_path_buf(),
            raw,
        }];
        let mut seen = HashSet::new();

        while let Some(parent) = chain.last().and_then(|p| p.raw.parent.clone()) {
            let child_path = chain.last().map(|p| p.path.clone()).unwrap_or_default();
            let coordinate = parent.coordinate(&child_path)?;
            if !seen.insert(coordinate.to_string()) {
                return Err(DescriptorError::invalid(
                    &child_path,
                    format!("cyclic parent reference through {coordinate}"),
                ));
            }

            let found = if local {
                local_parent(&child_path, &parent, &coordinate)
            } else {
                None
            };
            let next = match found {
                Some(p) => p,
                None => self.remote_parent(&coordinate, &child_path).await?,
            };
            debug!("descriptor: parent {} <- {}", coordinate, next.path.display());
            chain.push(next);
        }

        chain.reverse();
        Ok(chain)
    }

    async fn remote_parent(&self, coordinate: &Coordinate, child: &Path) -> Result<LoadedPom> {
        let path = self
            .resolver
            .resolve(&coordinate.pom())
            .await
            .map_err(|e| DescriptorError::MissingParent {
                parent: coordinate.to_string(),
                path: child.to_path_buf(),
                reason: e.to_string(),
            })?;
        let raw = read_pom(&path)?;
        Ok(LoadedPom { path, raw })
    }

    async fn build(
        &self,
        chain: Vec<LoadedPom>,
        path: &Path,
        strict: bool,
        depth: usize,
    ) -> Result<EffectiveModel> {
        let merged = merge_chain(&chain, self.options);
        let props = &merged.properties;

        let mut management = DependencyManagement::new();
        let mut boms = Vec::new();
        for raw in &merged.management {
            let dep = match raw.interpolate(props).into_edge(None) {
                Ok(dep) => dep,
                Err(reason) => {
                    if strict {
                        return Err(DescriptorError::invalid(path, reason));
                    }
                    debug!("descriptor: skip managed entry in {}: {reason}", path.display());
                    continue;
                }
            };
            if dep.scope == Scope::Import && dep.coordinate.kind() == "pom" {
                boms.push(dep.coordinate);
                continue;
            }
            management.insert(
                dep.coordinate.module_id(),
                ManagedDependency {
                    coordinate: dep.coordinate,
                    scope: raw.scope.as_deref().map(Scope::parse),
                    exclusions: dep.exclusions,
                },
            );
        }

        for bom in boms {
            if depth >= MAX_IMPORT_DEPTH {
                warn!("descriptor: import depth exceeded at {bom}, skipping");
                continue;
            }
            match self.load_artifact(&bom, depth + 1).await {
                Ok(imported) => {
                    debug!(
                        "descriptor: imported {} managed entries from {bom}",
                        imported.dependency_management.len()
                    );
                    for (id, managed) in imported.dependency_management {
                        management.entry(id).or_insert(managed);
                    }
                }
                Err(e) if strict => {
                    return Err(DescriptorError::invalid(
                        path,
                        format!("import of {bom} failed: {e}"),
                    ));
                }
                Err(e) => warn!("descriptor: import of {bom} failed: {e}"),
            }
        }

        let mut dependencies = Vec::with_capacity(merged.dependencies.len());
        for raw in &merged.dependencies {
            let raw = raw.interpolate(props);
            let managed = management.get(&raw.module_id());
            match raw.into_edge(managed) {
                Ok(edge) => dependencies.push(edge),
                Err(reason) if strict => return Err(DescriptorError::invalid(path, reason)),
                Err(reason) => debug!("descriptor: skip dependency in {}: {reason}", path.display()),
            }
        }

        Ok(EffectiveModel {
            path: path.to_path_buf(),
            group: merged.group,
            artifact: merged.artifact,
            version: merged.version,
            packaging: merged.packaging,
            properties: merged.properties,
            dependencies,
            dependency_management: management,
            repositories: merged.repositories,
            active_profiles: merged.active_profiles,
        })
    }
}

fn local_parent(child: &Path, parent: &ParentRef, coordinate: &Coordinate) -> Option<LoadedPom> {
    let relative = parent.relative_path.as_deref().unwrap_or("../pom.xml");
    if relative.is_empty() {
        return None;
    }
    let mut candidate = child.parent()?.join(relative);
    if candidate.is_dir() {
        candidate = candidate.join("pom.xml");
    }
    if !candidate.is_file() {
        return None;
    }
    let raw = match read_pom(&candidate) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("descriptor: ignoring local parent candidate: {e}");
            return None;
        }
    };
    let group = raw
        .group
        .clone()
        .or_else(|| raw.parent.as_ref().and_then(|p| p.group.clone()));
    let version = raw
        .version
        .clone()
        .or_else(|| raw.parent.as_ref().and_then(|p| p.version.clone()));
    let matches = group.as_deref() == Some(coordinate.group())
        && raw.artifact.as_deref() == Some(coordinate.name())
        && version.as_deref() == Some(coordinate.version());
    matches.then(|| LoadedPom {
        path: dunce::canonicalize(&candidate).unwrap_or(candidate),
        raw,
    })
}

/// Replace `${key}` occurrences; unknown keys are left verbatim.
pub fn interpolate(text: &str, props: &BTreeMap<String, String>) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_INTERPOLATION_PASSES {
        if !current.contains("${") {
            break;
        }
        let next = substitute_once(&current, props);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn substitute_once(text: &str, props: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match props.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Raw model and inheritance merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LoadedPom {
    path: PathBuf,
    raw: RawPom,
}

#[derive(Debug, Clone, Default)]
struct RawPom {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    packaging: Option<String>,
    parent: Option<ParentRef>,
    base: ModelBase,
    profiles: Vec<RawProfile>,
}

#[derive(Debug, Clone)]
struct ParentRef {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    /// `None` when the element is absent, `Some("")` when present but empty.
    relative_path: Option<String>,
}

impl ParentRef {
    fn coordinate(&self, child: &Path) -> Result<Coordinate> {
        match (&self.group, &self.artifact, &self.version) {
            (Some(g), Some(a), Some(v)) => Ok(Coordinate::new(g, a, v)),
            _ => Err(DescriptorError::invalid(
                child,
                "<parent> requires groupId, artifactId and version",
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ModelBase {
    properties: BTreeMap<String, String>,
    dependencies: Vec<RawDependency>,
    management: Vec<RawDependency>,
    repositories: Vec<RemoteRepository>,
}

#[derive(Debug, Clone, Default)]
struct RawProfile {
    id: String,
    active_by_default: bool,
    /// `(name, expected value)`; either may carry a leading `!`.
    property: Option<(String, Option<String>)>,
    base: ModelBase,
}

#[derive(Debug, Clone, Default)]
struct RawDependency {
    group: String,
    artifact: String,
    version: Option<String>,
    kind: Option<String>,
    classifier: Option<String>,
    scope: Option<String>,
    optional: Option<String>,
    system_path: Option<String>,
    exclusions: Vec<Exclusion>,
}

impl RawDependency {
    fn module_id(&self) -> ModuleId {
        ModuleId {
            group: self.group.clone(),
            name: self.artifact.clone(),
            classifier: self.classifier.clone(),
            kind: self.kind.clone().unwrap_or_else(|| "jar".to_string()),
        }
    }

    fn interpolate(&self, props: &BTreeMap<String, String>) -> RawDependency {
        let i = |v: &Option<String>| v.as_deref().map(|s| interpolate(s, props));
        RawDependency {
            group: interpolate(&self.group, props),
            artifact: interpolate(&self.artifact, props),
            version: i(&self.version),
            kind: i(&self.kind),
            classifier: i(&self.classifier),
            scope: i(&self.scope),
            optional: i(&self.optional),
            system_path: i(&self.system_path),
            exclusions: self
                .exclusions
                .iter()
                .map(|e| Exclusion::new(interpolate(&e.group, props), interpolate(&e.name, props)))
                .collect(),
        }
    }

    fn into_edge(self, managed: Option<&ManagedDependency>) -> std::result::Result<DependencyEdge, String> {
        let id = format!("{}:{}", self.group, self.artifact);
        let version = self
            .version
            .clone()
            .or_else(|| managed.map(|m| m.coordinate.version().to_string()))
            .ok_or_else(|| format!("dependency {id} has no version"))?;

        for (field, value) in [
            ("groupId", &self.group),
            ("artifactId", &self.artifact),
            ("version", &version),
        ] {
            if value.contains("${") {
                return Err(format!("unresolved placeholder in {field} of {id}: {value}"));
            }
        }

        let scope = self
            .scope
            .as_deref()
            .map(Scope::parse)
            .or_else(|| managed.and_then(|m| m.scope))
            .unwrap_or_default();
        let exclusions = if self.exclusions.is_empty() {
            managed.map(|m| m.exclusions.clone()).unwrap_or_default()
        } else {
            self.exclusions
        };

        let coordinate = Coordinate::new(self.group, self.artifact, version)
            .with_kind(self.kind.unwrap_or_default())
            .with_classifier(self.classifier);
        let optional = self
            .optional
            .is_some_and(|o| o.trim().eq_ignore_ascii_case("true"));

        Ok(DependencyEdge {
            coordinate,
            scope,
            optional,
            exclusions,
            system_path: self.system_path.map(PathBuf::from),
        })
    }
}

struct Merged {
    group: Option<String>,
    artifact: Option<String>,
    version: Option<String>,
    packaging: String,
    properties: BTreeMap<String, String>,
    dependencies: Vec<RawDependency>,
    management: Vec<RawDependency>,
    repositories: Vec<RemoteRepository>,
    active_profiles: Vec<String>,
}

/// Fold the chain (top-most ancestor first) into one model. Children
/// override parents; active profiles override their own POM.
fn merge_chain(chain: &[LoadedPom], opts: &LoadOptions) -> Merged {
    let mut merged = Merged {
        group: None,
        artifact: None,
        version: None,
        packaging: "jar".to_string(),
        properties: BTreeMap::new(),
        dependencies: Vec::new(),
        management: Vec::new(),
        repositories: Vec::new(),
        active_profiles: Vec::new(),
    };
    let mut parent_version = None;
    let mut parent_group = None;

    for (idx, loaded) in chain.iter().enumerate() {
        let raw = &loaded.raw;
        let is_leaf = idx + 1 == chain.len();

        if is_leaf {
            parent_group = raw.parent.as_ref().and_then(|p| p.group.clone());
            parent_version = raw.parent.as_ref().and_then(|p| p.version.clone());
        }
        merged.group = raw
            .group
            .clone()
            .or_else(|| raw.parent.as_ref().and_then(|p| p.group.clone()))
            .or(merged.group.take());
        merged.version = raw
            .version
            .clone()
            .or_else(|| raw.parent.as_ref().and_then(|p| p.version.clone()))
            .or(merged.version.take());
        merged.artifact = raw.artifact.clone();
        // packaging is not inherited
        merged.packaging = raw.packaging.clone().unwrap_or_else(|| "jar".to_string());

        let mut layers = vec![&raw.base];
        for profile in active_profiles(&raw.profiles, opts) {
            merged.active_profiles.push(profile.id.clone());
            layers.push(&profile.base);
        }
        for base in layers {
            merged.properties.extend(base.properties.clone());
            merge_dependencies(&mut merged.dependencies, &base.dependencies);
            merge_dependencies(&mut merged.management, &base.management);
            for repo in &base.repositories {
                if !merged.repositories.iter().any(|r| r.url == repo.url) {
                    merged.repositories.push(repo.clone());
                }
            }
        }
    }

    let project = [
        ("groupId", merged.group.clone()),
        ("artifactId", merged.artifact.clone()),
        ("version", merged.version.clone()),
        ("packaging", Some(merged.packaging.clone())),
        ("parent.groupId", parent_group),
        ("parent.version", parent_version),
    ];
    for (key, value) in project {
        if let Some(value) = value {
            merged.properties.insert(format!("project.{key}"), value.clone());
            merged.properties.insert(format!("pom.{key}"), value.clone());
            if key.starts_with("parent.") {
                merged.properties.insert(key.to_string(), value);
            }
        }
    }
    if let Some(dir) = chain.last().and_then(|l| l.path.parent()) {
        let dir = dir.to_string_lossy().to_string();
        merged.properties.insert("project.basedir".into(), dir.clone());
        merged.properties.insert("basedir".into(), dir);
    }
    for (k, v) in &opts.env {
        merged.properties.insert(format!("env.{k}"), v.clone());
    }
    merged.properties.extend(opts.user_properties.clone());

    let snapshot = merged.properties.clone();
    for value in merged.properties.values_mut() {
        *value = interpolate(value, &snapshot);
    }
    // coordinates may reference properties, e.g. `${revision}`
    for field in [&mut merged.group, &mut merged.version] {
        if let Some(value) = field {
            *value = interpolate(value, &merged.properties);
        }
    }
    merged
}

fn merge_dependencies(into: &mut Vec<RawDependency>, from: &[RawDependency]) {
    for dep in from {
        let key = dep.module_id();
        match into.iter_mut().find(|d| d.module_id() == key) {
            Some(existing) => *existing = dep.clone(),
            None => into.push(dep.clone()),
        }
    }
}

fn active_profiles<'p>(profiles: &'p [RawProfile], opts: &LoadOptions) -> Vec<&'p RawProfile> {
    let enabled: Vec<&RawProfile> = profiles
        .iter()
        .filter(|p| !opts.explicitly_inactive(&p.id))
        .collect();

    let triggered: Vec<&RawProfile> = enabled
        .iter()
        .copied()
        .filter(|p| opts.explicitly_active(&p.id) || property_matches(p, opts))
        .collect();
    if !triggered.is_empty() {
        return triggered;
    }
    enabled.into_iter().filter(|p| p.active_by_default).collect()
}

fn property_matches(profile: &RawProfile, opts: &LoadOptions) -> bool {
    let Some((name, expected)) = &profile.property else {
        return false;
    };
    let (negated, name) = match name.strip_prefix('!') {
        Some(n) => (true, n),
        None => (false, name.as_str()),
    };
    let actual = opts.lookup(name);
    match expected {
        None => actual.is_some() != negated,
        Some(expected) => {
            let (value_negated, expected) = match expected.strip_prefix('!') {
                Some(e) => (true, e),
                None => (false, expected.as_str()),
            };
            match actual {
                Some(actual) => (actual == expected) != value_negated,
                None => false,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// XML parsing
// ---------------------------------------------------------------------------

fn read_pom(path: &Path) -> Result<RawPom> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DescriptorError::invalid(path, format!("cannot read: {e}")))?;
    parse_pom(&text).map_err(|reason| DescriptorError::invalid(path, reason))
}

fn parse_pom(text: &str) -> std::result::Result<RawPom, String> {
    let doc = roxmltree::Document::parse(text).map_err(|e| e.to_string())?;
    let project = doc.root_element();
    if project.tag_name().name() != "project" {
        return Err(format!(
            "expected <project> root element, found <{}>",
            project.tag_name().name()
        ));
    }

    let parent = child_element(&project, "parent").map(|p| ParentRef {
        group: child_text(&p, "groupId"),
        artifact: child_text(&p, "artifactId"),
        version: child_text(&p, "version"),
        relative_path: child_element(&p, "relativePath")
            .map(|n| n.text().map(str::trim).unwrap_or_default().to_string()),
    });

    let profiles = child_element(&project, "profiles")
        .map(|ps| {
            elements(&ps, "profile")
                .map(|p| parse_profile(&p))
                .collect()
        })
        .unwrap_or_default();

    Ok(RawPom {
        group: child_text(&project, "groupId"),
        artifact: child_text(&project, "artifactId"),
        version: child_text(&project, "version"),
        packaging: child_text(&project, "packaging"),
        parent,
        base: parse_base(&project),
        profiles,
    })
}

fn parse_profile(node: &roxmltree::Node<'_, '_>) -> RawProfile {
    let activation = child_element(node, "activation");
    let active_by_default = activation
        .as_ref()
        .and_then(|a| child_text(a, "activeByDefault"))
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let property = activation
        .as_ref()
        .and_then(|a| child_element(a, "property"))
        .and_then(|p| Some((child_text(&p, "name")?, child_text(&p, "value"))));

    RawProfile {
        id: child_text(node, "id").unwrap_or_else(|| "default".to_string()),
        active_by_default,
        property,
        base: parse_base(node),
    }
}

fn parse_base(node: &roxmltree::Node<'_, '_>) -> ModelBase {
    let mut base = ModelBase::default();

    if let Some(props) = child_element(node, "properties") {
        for child in props.children().filter(|n| n.is_element()) {
            let value = child.text().map(str::trim).unwrap_or_default();
            base.properties
                .insert(child.tag_name().name().to_string(), value.to_string());
        }
    }
    if let Some(deps) = child_element(node, "dependencies") {
        base.dependencies = parse_dependencies(&deps);
    }
    if let Some(deps) = child_element(node, "dependencyManagement")
        .and_then(|dm| child_element(&dm, "dependencies"))
    {
        base.management = parse_dependencies(&deps);
    }
    if let Some(repos) = child_element(node, "repositories") {
        base.repositories = elements(&repos, "repository")
            .filter_map(|r| {
                let url = child_text(&r, "url")?;
                let id = child_text(&r, "id").unwrap_or_else(|| url.clone());
                Some(RemoteRepository::new(id, url))
            })
            .collect();
    }
    base
}

fn parse_dependencies(node: &roxmltree::Node<'_, '_>) -> Vec<RawDependency> {
    elements(node, "dependency")
        .filter_map(|d| {
            let exclusions = child_element(&d, "exclusions")
                .map(|ex| {
                    elements(&ex, "exclusion")
                        .filter_map(|e| {
                            Some(Exclusion::new(
                                child_text(&e, "groupId")?,
                                child_text(&e, "artifactId")?,
                            ))
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(RawDependency {
                group: child_text(&d, "groupId")?,
                artifact: child_text(&d, "artifactId")?,
                version: child_text(&d, "version"),
                kind: child_text(&d, "type"),
                classifier: child_text(&d, "classifier"),
                scope: child_text(&d, "scope"),
                optional: child_text(&d, "optional"),
                system_path: child_text(&d, "systemPath"),
                exclusions,
            })
        })
        .collect()
}

fn elements<'a, 'input: 'a>(
    node: &roxmltree::Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child_element<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
