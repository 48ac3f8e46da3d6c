//! Classpath assembly from an effective model and ad-hoc extra artifacts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::coordinate::{Coordinate, DependencyEdge, ModuleId, Scope};
use crate::descriptor::EffectiveModel;
use crate::repository::ArtifactFetcher;
use crate::resolver::{ArtifactResolver, Resolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathEntry {
    /// `None` for entries supplied as raw paths.
    pub coordinate: Option<Coordinate>,
    pub path: PathBuf,
    pub depth: usize,
}

/// Ordered, version-deduplicated list of local artifact files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedClasspath {
    entries: Vec<ClasspathEntry>,
}

impl ResolvedClasspath {
    /// Appends unless a version-equivalent coordinate (or the same path) is
    /// already present. Returns whether the entry was kept.
    pub fn push(&mut self, entry: ClasspathEntry) -> bool {
        let duplicate = self.entries.iter().any(|e| match (&e.coordinate, &entry.coordinate) {
            (Some(a), Some(b)) => a.module_id() == b.module_id(),
            _ => e.path == entry.path,
        });
        if !duplicate {
            self.entries.push(entry);
        }
        !duplicate
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn contains_module(&self, id: &ModuleId) -> bool {
        self.entries
            .iter()
            .filter_map(|e| e.coordinate.as_ref())
            .any(|c| &c.module_id() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extend(&mut self, other: ResolvedClasspath) {
        for entry in other.entries {
            self.push(entry);
        }
    }
}

/// A user-supplied extra artifact: an existing file or a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSpec {
    Path(PathBuf),
    Coordinate(Coordinate),
}

impl ArtifactSpec {
    /// Existing files are paths; otherwise anything that parses as a
    /// coordinate is one; the rest is treated as a (missing) path.
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        let path = PathBuf::from(raw);
        if path.exists() {
            return ArtifactSpec::Path(path);
        }
        match Coordinate::parse(raw) {
            Ok(c) => ArtifactSpec::Coordinate(c),
            Err(_) => ArtifactSpec::Path(path),
        }
    }
}

pub struct ClasspathAssembler<'a, F> {
    resolver: &'a ArtifactResolver<F>,
}

impl<'a, F: ArtifactFetcher> ClasspathAssembler<'a, F> {
    pub fn new(resolver: &'a ArtifactResolver<F>) -> Self {
        Self { resolver }
    }

    /// Resolve the model's classpath-scoped dependencies and their closure.
    #[instrument(skip_all, fields(dependencies = model.dependencies.len()))]
    pub async fn assemble(&self, model: &EffectiveModel) -> Resolution {
        self.resolver.add_remotes(&model.repositories);
        let edges: Vec<DependencyEdge> = model
            .dependencies
            .iter()
            .filter(|e| e.scope.on_classpath())
            .cloned()
            .collect();
        let skipped = model.dependencies.len() - edges.len();
        if skipped > 0 {
            info!("classpath: {skipped} test/import-scoped dependencies left out");
        }
        self.resolver
            .resolve_managed(&edges, &model.dependency_management)
            .await
    }

    /// Resolve extra artifacts. Paths are taken as-is when they exist;
    /// coordinates are resolved with their transitive closure.
    #[instrument(skip_all, fields(specs = specs.len()))]
    pub async fn resolve_extra(&self, specs: &[ArtifactSpec]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen_paths = HashSet::new();
        let mut edges = Vec::new();

        for spec in specs {
            match spec {
                ArtifactSpec::Path(path) => {
                    if !path.is_file() {
                        warn!("classpath: extra artifact {} does not exist", path.display());
                        continue;
                    }
                    if seen_paths.insert(path.clone()) {
                        resolution.classpath.push(ClasspathEntry {
                            coordinate: None,
                            path: path.clone(),
                            depth: 0,
                        });
                    }
                }
                ArtifactSpec::Coordinate(c) => {
                    edges.push(DependencyEdge::new(c.clone(), Scope::Runtime));
                }
            }
        }

        if !edges.is_empty() {
            let resolved = self.resolver.resolve_transitive(&edges).await;
            resolution.classpath.extend(resolved.classpath);
            resolution.failures.extend(resolved.failures);
        }
        resolution
    }
}
