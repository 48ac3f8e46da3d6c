//! Artifact coordinates, module identities and dependency edges.
//!
//! A [`Coordinate`] fully identifies one resolvable file. Its [`ModuleId`] is
//! the same identity with the version stripped; two coordinates with equal
//! module ids are *version-equivalent* and only the first one encountered
//! survives on a classpath.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{ResolveError, Result};

pub const DEFAULT_KIND: &str = "jar";

/// `group:name:version` plus optional classifier and packaging type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    group: String,
    name: String,
    version: String,
    classifier: Option<String>,
    kind: String,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: None,
            kind: DEFAULT_KIND.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: Option<String>) -> Self {
        self.classifier = classifier.filter(|c| !c.is_empty());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        self.kind = if kind.is_empty() {
            DEFAULT_KIND.to_string()
        } else {
            kind
        };
        self
    }

    /// Parse `group:name:version`, `group:name:type:version` or
    /// `group:name:type:classifier:version`.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(ResolveError::InvalidCoordinate(s.to_string()));
        }
        let coord = match parts.as_slice() {
            [g, a, v] => Coordinate::new(*g, *a, *v),
            [g, a, t, v] => Coordinate::new(*g, *a, *v).with_kind(*t),
            [g, a, t, c, v] => Coordinate::new(*g, *a, *v)
                .with_kind(*t)
                .with_classifier(Some(c.to_string())),
            _ => return Err(ResolveError::InvalidCoordinate(s.to_string())),
        };
        Ok(coord)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn module_id(&self) -> ModuleId {
        ModuleId {
            group: self.group.clone(),
            name: self.name.clone(),
            classifier: self.classifier.clone(),
            kind: self.kind.clone(),
        }
    }

    /// The descriptor (`.pom`) of this artifact.
    pub fn pom(&self) -> Coordinate {
        Coordinate::new(&self.group, &self.name, &self.version).with_kind("pom")
    }

    /// File extension implied by the packaging type.
    pub fn extension(&self) -> &str {
        match self.kind.as_str() {
            "jar" | "bundle" | "maven-plugin" | "ejb" | "test-jar" | "ejb-client" => "jar",
            other => other,
        }
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.name, self.version, c, self.extension()),
            None => format!("{}-{}.{}", self.name, self.version, self.extension()),
        }
    }

    /// Repository-relative path using `/` separators:
    /// `org/example/lib/1.0/lib-1.0.jar`.
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.name,
            self.version,
            self.file_name()
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.classifier, self.kind.as_str()) {
            (None, DEFAULT_KIND) => write!(f, "{}:{}:{}", self.group, self.name, self.version),
            (None, kind) => write!(f, "{}:{}:{}:{}", self.group, self.name, kind, self.version),
            (Some(c), kind) => write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group, self.name, kind, c, self.version
            ),
        }
    }
}

/// Version-stripped identity used as the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
    pub classifier: Option<String>,
    pub kind: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            classifier: None,
            kind: DEFAULT_KIND.to_string(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.kind)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl Scope {
    /// Unknown scope names fall back to `compile`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "provided" => Scope::Provided,
            "runtime" => Scope::Runtime,
            "test" => Scope::Test,
            "system" => Scope::System,
            "import" => Scope::Import,
            _ => Scope::Compile,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
            Scope::Import => "import",
        }
    }

    /// Whether an edge with this scope contributes to the compile classpath.
    pub fn on_classpath(&self) -> bool {
        !matches!(self, Scope::Test | Scope::Import)
    }

    /// Scope of a transitive dependency reached through a parent edge, or
    /// `None` when the child does not propagate.
    pub fn inherit(parent: Scope, child: Scope) -> Option<Scope> {
        match child {
            Scope::Compile | Scope::Runtime => {}
            _ => return None,
        }
        match parent {
            Scope::Compile => Some(child),
            Scope::Runtime => Some(Scope::Runtime),
            Scope::Provided => Some(Scope::Provided),
            Scope::Test => Some(Scope::Test),
            Scope::System | Scope::Import => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `group:name` pattern removed from a dependency's transitive closure.
/// Either part may be `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub group: String,
    pub name: String,
}

impl Exclusion {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn matches(&self, id: &ModuleId) -> bool {
        (self.group == "*" || self.group == id.group) && (self.name == "*" || self.name == id.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
    /// Only meaningful for `system` scope.
    pub system_path: Option<PathBuf>,
}

impl DependencyEdge {
    pub fn new(coordinate: Coordinate, scope: Scope) -> Self {
        Self {
            coordinate,
            scope,
            optional: false,
            exclusions: Vec::new(),
            system_path: None,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<Exclusion>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn excludes(&self, id: &ModuleId) -> bool {
        self.exclusions.iter().any(|e| e.matches(id))
    }
}
