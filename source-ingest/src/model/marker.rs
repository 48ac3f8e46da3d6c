//! Provenance markers attached to source units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    BuildEnvironment,
    OperatingSystem,
    BuildTool,
    Project,
    RuntimeVersion,
    SourceSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Marker {
    /// CI provider facts, or `local` outside CI.
    BuildEnvironment {
        provider: String,
        build_id: Option<String>,
        build_url: Option<String>,
    },
    OperatingSystem {
        family: String,
        arch: String,
    },
    BuildTool {
        name: String,
        version: Option<String>,
    },
    Project {
        name: String,
        group: String,
        artifact: String,
        version: String,
    },
    RuntimeVersion {
        runtime: String,
        source_release: Option<String>,
        target_release: Option<String>,
    },
    SourceSet {
        name: String,
    },
}

impl Marker {
    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::BuildEnvironment { .. } => MarkerKind::BuildEnvironment,
            Marker::OperatingSystem { .. } => MarkerKind::OperatingSystem,
            Marker::BuildTool { .. } => MarkerKind::BuildTool,
            Marker::Project { .. } => MarkerKind::Project,
            Marker::RuntimeVersion { .. } => MarkerKind::RuntimeVersion,
            Marker::SourceSet { .. } => MarkerKind::SourceSet,
        }
    }
}

/// At most one marker per [`MarkerKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers(BTreeMap<MarkerKind, Marker>);

impl Markers {
    /// Adds `marker` unless one of the same kind is present. Returns whether
    /// it was added.
    pub fn add_if_absent(&mut self, marker: Marker) -> bool {
        let kind = marker.kind();
        if self.0.contains_key(&kind) {
            return false;
        }
        self.0.insert(kind, marker);
        true
    }

    pub fn get(&self, kind: MarkerKind) -> Option<&Marker> {
        self.0.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_marker_of_a_kind_is_ignored() {
        let mut markers = Markers::default();
        assert!(markers.add_if_absent(Marker::SourceSet { name: "main".into() }));
        assert!(!markers.add_if_absent(Marker::SourceSet { name: "test".into() }));
        assert_eq!(
            markers.get(MarkerKind::SourceSet),
            Some(&Marker::SourceSet { name: "main".into() })
        );
        assert_eq!(markers.len(), 1);
    }
}
