//! Coordinate resolution against a local cache and ordered remotes.
//!
//! `resolve` fetches a single artifact; `resolve_transitive` walks the
//! dependency graph breadth-first so that the shallowest version of every
//! module wins. Failures are collected per coordinate and never abort the
//! walk.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use futures::{StreamExt, stream};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::classpath::{ClasspathEntry, ResolvedClasspath};
use crate::coordinate::{Coordinate, DependencyEdge, Exclusion, ModuleId, Scope};
use crate::descriptor::{DependencyManagement, DescriptorLoader, LoadOptions};
use crate::errors::{ResolveError, Result};
use crate::repository::{ArtifactFetcher, LocalRepository, RemoteRepository};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub local_repository: PathBuf,
    pub remotes: Vec<RemoteRepository>,
    /// Upper bound on concurrent fetches within one BFS level.
    pub concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            local_repository: LocalRepository::default_location(),
            remotes: RemoteRepository::defaults(),
            concurrency: 8,
        }
    }
}

/// One coordinate that could not be resolved.
#[derive(Debug)]
pub struct ResolutionFailure {
    pub coordinate: Coordinate,
    pub error: ResolveError,
}

/// A possibly partial classpath plus the failures that made it partial.
#[derive(Debug, Default)]
pub struct Resolution {
    pub classpath: ResolvedClasspath,
    pub failures: Vec<ResolutionFailure>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ArtifactResolver<F> {
    local: LocalRepository,
    remotes: RwLock<Vec<RemoteRepository>>,
    fetcher: F,
    locks: DashMap<String, Arc<Mutex<()>>>,
    concurrency: usize,
    pom_options: LoadOptions,
}

struct Pending {
    edge: DependencyEdge,
    depth: usize,
    /// Exclusions accumulated from every ancestor edge.
    exclusions: Vec<Exclusion>,
}

impl<F: ArtifactFetcher> ArtifactResolver<F> {
    pub fn new(config: ResolverConfig, fetcher: F) -> Self {
        Self {
            local: LocalRepository::new(config.local_repository),
            remotes: RwLock::new(config.remotes),
            fetcher,
            locks: DashMap::new(),
            concurrency: config.concurrency.max(1),
            pom_options: LoadOptions::default(),
        }
    }

    pub fn local(&self) -> &LocalRepository {
        &self.local
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Append repositories declared by a build descriptor, skipping urls
    /// already configured.
    pub fn add_remotes(&self, repos: &[RemoteRepository]) {
        let mut remotes = self.remotes.write();
        for repo in repos {
            if !remotes.iter().any(|r| r.url == repo.url) {
                debug!("resolver: adding remote {} ({})", repo.id, repo.url);
                remotes.push(repo.clone());
            }
        }
    }

    pub fn remotes(&self) -> Vec<RemoteRepository> {
        self.remotes.read().clone()
    }

    /// Resolve one coordinate to a file in the local cache, fetching it from
    /// the first remote that has it when necessary.
    pub async fn resolve(&self, coordinate: &Coordinate) -> Result<PathBuf> {
        let dest = self.local.path_for(coordinate);
        if dest.is_file() {
            debug!("resolver: cache hit {coordinate}");
            return Ok(dest);
        }

        let key = coordinate.to_string();
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.fetch_into_cache(coordinate, dest).await
        };
        drop(lock);
        // last user drops the entry
        self.locks.remove_if(&key, |_, l| Arc::strong_count(l) == 1);
        result
    }

    /// Number of coordinates currently holding a fetch lock.
    pub fn pending_fetches(&self) -> usize {
        self.locks.len()
    }

    async fn fetch_into_cache(&self, coordinate: &Coordinate, dest: PathBuf) -> Result<PathBuf> {
        // another task may have filled the entry while we waited
        if dest.is_file() {
            return Ok(dest);
        }

        let remotes = self.remotes();
        let mut corrupt = None;
        for remote in &remotes {
            let url = remote.artifact_url(coordinate);
            let bytes = match self.fetcher.fetch(&url).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!("resolver: {coordinate} not in {}", remote.id);
                    continue;
                }
                Err(e) => {
                    warn!("resolver: {coordinate} from {} failed: {e}", remote.id);
                    continue;
                }
            };

            if let Err(e) = self.verify(coordinate, &url, &bytes).await {
                warn!("resolver: {e}");
                corrupt = Some(e);
                continue;
            }

            write_atomically(dest.clone(), bytes).await?;
            info!("resolver: fetched {coordinate} from {}", remote.id);
            return Ok(dest);
        }

        Err(corrupt.unwrap_or_else(|| ResolveError::ArtifactNotFound {
            coordinate: coordinate.to_string(),
            tried: remotes.len(),
        }))
    }

    async fn verify(&self, coordinate: &Coordinate, url: &str, bytes: &[u8]) -> Result<()> {
        let corrupt = |reason: String| ResolveError::ArtifactCorrupt {
            coordinate: coordinate.to_string(),
            reason,
        };

        if coordinate.extension() == "jar"
            && !(bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC))
        {
            return Err(corrupt("not a zip archive".into()));
        }

        let sidecar = match self.fetcher.fetch(&format!("{url}.sha256")).await {
            Ok(Some(sidecar)) => sidecar,
            Ok(None) => return Ok(()),
            Err(e) => {
                debug!("resolver: no checksum for {coordinate}: {e}");
                return Ok(());
            }
        };
        let expected = String::from_utf8_lossy(&sidecar)
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let actual = sha256_hex(bytes);
        if expected != actual {
            return Err(corrupt(format!(
                "sha256 mismatch (expected {expected}, got {actual})"
            )));
        }
        Ok(())
    }

    /// Breadth-first transitive resolution without external management.
    pub async fn resolve_transitive(&self, edges: &[DependencyEdge]) -> Resolution {
        self.resolve_managed(edges, &DependencyManagement::new()).await
    }

    /// Breadth-first transitive resolution. Versions of transitive
    /// dependencies are pinned by `management` when it has an entry.
    #[instrument(skip_all, fields(roots = edges.len()))]
    pub async fn resolve_managed(
        &self,
        edges: &[DependencyEdge],
        management: &DependencyManagement,
    ) -> Resolution {
        let mut seen: HashSet<ModuleId> = HashSet::new();
        let mut resolution = Resolution::default();
        let mut level: Vec<Pending> = edges
            .iter()
            .filter(|e| e.scope.on_classpath())
            .map(|e| Pending {
                edge: e.clone(),
                depth: 0,
                exclusions: e.exclusions.clone(),
            })
            .collect();

        while !level.is_empty() {
            let accepted: Vec<Pending> = level
                .into_iter()
                .filter(|p| seen.insert(p.edge.coordinate.module_id()))
                .collect();

            let outcomes: Vec<_> = stream::iter(accepted.into_iter().map(|p| async move {
                let artifact = self.resolve_edge(&p.edge).await;
                let children = self.children(&p, management).await;
                (p, artifact, children)
            }))
            .buffered(self.concurrency)
            .collect()
            .await;

            let mut next = Vec::new();
            for (pending, artifact, children) in outcomes {
                let coordinate = pending.edge.coordinate.clone();
                match artifact {
                    Ok(Some(path)) => {
                        let kept = resolution.classpath.push(ClasspathEntry {
                            coordinate: Some(coordinate.clone()),
                            path,
                            depth: pending.depth,
                        });
                        if !kept {
                            debug!("resolver: {coordinate} already on the classpath");
                        }
                    }
                    Ok(None) => {}
                    Err(error) => {
                        warn!("resolver: {coordinate}: {error}");
                        resolution.failures.push(ResolutionFailure { coordinate, error });
                    }
                }
                next.extend(children);
            }
            level = next;
        }

        info!(
            "resolver: classpath={} failures={}",
            resolution.classpath.len(),
            resolution.failures.len()
        );
        resolution
    }

    /// `Ok(None)` for edges that contribute no file (pom-typed dependencies).
    async fn resolve_edge(&self, edge: &DependencyEdge) -> Result<Option<PathBuf>> {
        if edge.coordinate.kind() == "pom" {
            return Ok(None);
        }
        if edge.scope == Scope::System {
            return match &edge.system_path {
                Some(p) if p.is_file() => Ok(Some(p.clone())),
                _ => Err(ResolveError::ArtifactNotFound {
                    coordinate: edge.coordinate.to_string(),
                    tried: 0,
                }),
            };
        }
        self.resolve(&edge.coordinate).await.map(Some)
    }

    async fn children(&self, parent: &Pending, management: &DependencyManagement) -> Vec<Pending> {
        if parent.edge.scope == Scope::System {
            return Vec::new();
        }
        let loader = DescriptorLoader::new(self, &self.pom_options);
        let model = match loader.load_artifact(&parent.edge.coordinate, 0).await {
            Ok(model) => model,
            Err(e) => {
                warn!(
                    "resolver: no transitive information for {}: {e}",
                    parent.edge.coordinate
                );
                return Vec::new();
            }
        };

        model
            .dependencies
            .into_iter()
            .filter(|d| !d.optional)
            .filter(|d| {
                let id = d.coordinate.module_id();
                !parent.exclusions.iter().any(|e| e.matches(&id))
            })
            .filter_map(|mut d| {
                d.scope = Scope::inherit(parent.edge.scope, d.scope)?;
                if let Some(managed) = management.get(&d.coordinate.module_id()) {
                    d.coordinate = managed.coordinate.clone();
                }
                let mut exclusions = parent.exclusions.clone();
                exclusions.extend(d.exclusions.iter().cloned());
                Some(Pending {
                    edge: d,
                    depth: parent.depth + 1,
                    exclusions,
                })
            })
            .collect()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Write through a temp file in the destination directory, then rename.
async fn write_atomically(dest: PathBuf, bytes: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || write_atomically_blocking(&dest, &bytes)).await?
}

fn write_atomically_blocking(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| ResolveError::io(dest, std::io::Error::other("no parent directory")))?;
    std::fs::create_dir_all(dir).map_err(|e| ResolveError::io(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ResolveError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| ResolveError::io(dest, e))?;
    tmp.as_file().sync_all().map_err(|e| ResolveError::io(dest, e))?;
    tmp.persist(dest).map_err(|e| ResolveError::io(dest, e.error))?;
    Ok(())
}
