//! Maven-style artifact resolution.
//!
//! - [`descriptor`] turns a `pom.xml` into an effective dependency list
//! - [`resolver`] fetches artifacts into the local cache and walks their closure
//! - [`classpath`] assembles the ordered classpath handed to parsers

pub mod classpath;
pub mod coordinate;
pub mod descriptor;
pub mod errors;
pub mod repository;
pub mod resolver;

pub use classpath::{ArtifactSpec, ClasspathAssembler, ClasspathEntry, ResolvedClasspath};
pub use coordinate::{Coordinate, DependencyEdge, Exclusion, ModuleId, Scope};
pub use descriptor::{DescriptorLoader, EffectiveModel, LoadOptions};
pub use errors::{DescriptorError, ResolveError};
pub use repository::{
    ArtifactFetcher, HttpFetcher, LocalRepository, MemoryFetcher, RemoteRepository,
};
pub use resolver::{ArtifactResolver, Resolution, ResolutionFailure, ResolverConfig};
