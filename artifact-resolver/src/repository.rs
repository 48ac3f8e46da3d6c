//! Local cache layout, remote repository endpoints and the fetch seam.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::coordinate::Coordinate;
use crate::errors::{ResolveError, Result};

pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2/";
pub const SONATYPE_SNAPSHOTS: &str = "https://oss.sonatype.org/content/repositories/snapshots/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub id: String,
    /// Always ends with `/`.
    pub url: String,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self { id: id.into(), url }
    }

    /// Maven Central followed by the Sonatype snapshots repository.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("central", MAVEN_CENTRAL),
            Self::new("sonatype-snapshots", SONATYPE_SNAPSHOTS),
        ]
    }

    pub fn artifact_url(&self, coordinate: &Coordinate) -> String {
        format!("{}{}", self.url, coordinate.repository_path())
    }
}

/// `~/.m2/repository`-style cache addressed by group/name/version.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$HOME/.m2/repository`, or `.m2/repository` relative to the working
    /// directory when no home directory is known.
    pub fn default_location() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .map(|home| home.join(".m2").join("repository"))
            .unwrap_or_else(|| PathBuf::from(".m2/repository"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, coordinate: &Coordinate) -> PathBuf {
        coordinate
            .repository_path()
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new(Self::default_location())
    }
}

/// Transport used to reach remote repositories and remote payloads.
///
/// `fetch` returns `Ok(None)` when the location answers "not found"; any other
/// failure is an error for that location only.
pub trait ArtifactFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Stream the body at `url` into `out`, returning the number of bytes
    /// copied. A missing resource is an error here.
    fn copy_to<W>(&self, url: &str, out: &mut W) -> impl Future<Output = Result<u64>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("rewrite-runner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        debug!("http: GET {url}");
        let resp = self.client.get(url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            s if s.is_success() => Ok(Some(resp.bytes().await?.to_vec())),
            s => Err(ResolveError::Http {
                url: url.to_string(),
                message: format!("unexpected status {s}"),
            }),
        }
    }

    async fn copy_to<W>(&self, url: &str, out: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut resp = self.client.get(url).send().await?.error_for_status()?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            out.write_all(&chunk)
                .await
                .map_err(|e| ResolveError::io(url, e))?;
            written += chunk.len() as u64;
        }
        out.flush().await.map_err(|e| ResolveError::io(url, e))?;
        Ok(written)
    }
}

/// Fetcher serving a fixed set of urls from memory.
///
/// An empty one turns the resolver into a cache-only (offline) resolver.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    bodies: RwLock<HashMap<String, Vec<u8>>>,
    requests: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.write().insert(url.into(), body.into());
    }

    /// Serve `body` for `coordinate` under `repo`.
    pub fn insert_artifact(
        &self,
        repo: &RemoteRepository,
        coordinate: &Coordinate,
        body: impl Into<Vec<u8>>,
    ) {
        self.insert(repo.artifact_url(coordinate), body);
    }

    /// Number of `fetch`/`copy_to` calls served so far, hits and misses.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl ArtifactFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        Ok(self.bodies.read().get(url).cloned())
    }

    async fn copy_to<W>(&self, url: &str, out: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let body = self.bodies.read().get(url).cloned();
        let body = body.ok_or_else(|| ResolveError::Http {
            url: url.to_string(),
            message: "not found".to_string(),
        })?;
        out.write_all(&body)
            .await
            .map_err(|e| ResolveError::io(url, e))?;
        out.flush().await.map_err(|e| ResolveError::io(url, e))?;
        Ok(body.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_urls_follow_repository_layout() {
        let repo = RemoteRepository::new("central", "https://repo.example.org/maven2");
        let c = Coordinate::new("org.example", "lib", "1.2");
        assert_eq!(
            repo.artifact_url(&c),
            "https://repo.example.org/maven2/org/example/lib/1.2/lib-1.2.jar"
        );
    }

    #[test]
    fn local_paths_nest_by_group_name_version() {
        let local = LocalRepository::new("/cache");
        let c = Coordinate::new("org.example", "lib", "1.2").with_kind("pom");
        assert_eq!(
            local.path_for(&c),
            PathBuf::from("/cache/org/example/lib/1.2/lib-1.2.pom")
        );
    }
}
