//! Run-scoped provenance bundle.
//!
//! Built once per run from the environment and the effective build model,
//! then stamped onto every unit. Stamping only adds markers whose kind is
//! absent, so it is idempotent and order-independent.

use std::collections::BTreeMap;
use std::path::Path;

use artifact_resolver::EffectiveModel;

use crate::model::{Marker, SourceUnit};

const STANDALONE: &str = "standalone";
const STANDALONE_VERSION: &str = "1.0.0";

/// `(env flag, provider, build id var, build url var)`
const CI_PROVIDERS: &[(&str, &str, &str, &str)] = &[
    ("GITHUB_ACTIONS", "github-actions", "GITHUB_RUN_ID", ""),
    ("GITLAB_CI", "gitlab", "CI_JOB_ID", "CI_JOB_URL"),
    ("JENKINS_URL", "jenkins", "BUILD_NUMBER", "BUILD_URL"),
    ("CIRCLECI", "circleci", "CIRCLE_BUILD_NUM", "CIRCLE_BUILD_URL"),
    ("TRAVIS", "travis", "TRAVIS_BUILD_ID", "TRAVIS_BUILD_WEB_URL"),
    ("BUILDKITE", "buildkite", "BUILDKITE_BUILD_ID", "BUILDKITE_BUILD_URL"),
    ("TF_BUILD", "azure-devops", "BUILD_BUILDID", ""),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceBundle {
    markers: Vec<Marker>,
}

impl ProvenanceBundle {
    /// `model` is absent for projects without a build descriptor.
    pub fn collect(
        root: &Path,
        model: Option<&EffectiveModel>,
        env: &BTreeMap<String, String>,
    ) -> Self {
        let dir_name = dunce::canonicalize(root)
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| STANDALONE.to_string());

        let project = match model {
            Some(m) => Marker::Project {
                name: m.artifact.clone().unwrap_or_else(|| dir_name.clone()),
                group: m.group.clone().unwrap_or_else(|| STANDALONE.to_string()),
                artifact: m.artifact.clone().unwrap_or_else(|| dir_name.clone()),
                version: m
                    .version
                    .clone()
                    .unwrap_or_else(|| STANDALONE_VERSION.to_string()),
            },
            None => Marker::Project {
                name: dir_name,
                group: STANDALONE.to_string(),
                artifact: STANDALONE.to_string(),
                version: STANDALONE_VERSION.to_string(),
            },
        };

        let build_tool = Marker::BuildTool {
            name: if model.is_some() { "maven" } else { STANDALONE }.to_string(),
            version: None,
        };

        let prop = |key: &str| model.and_then(|m| m.properties.get(key)).cloned();
        let release = prop("maven.compiler.release");
        let runtime = Marker::RuntimeVersion {
            runtime: "java".to_string(),
            source_release: release.clone().or_else(|| prop("maven.compiler.source")),
            target_release: release.or_else(|| prop("maven.compiler.target")),
        };

        Self {
            markers: vec![
                build_environment(env),
                Marker::OperatingSystem {
                    family: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                },
                build_tool,
                project,
                runtime,
                Marker::SourceSet {
                    name: "main".to_string(),
                },
            ],
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn stamp(&self, unit: SourceUnit) -> SourceUnit {
        self.markers
            .iter()
            .cloned()
            .fold(unit, |unit, marker| unit.with_marker(marker))
    }
}

fn build_environment(env: &BTreeMap<String, String>) -> Marker {
    let get = |key: &str| {
        (!key.is_empty())
            .then(|| env.get(key))
            .flatten()
            .filter(|v| !v.is_empty())
            .cloned()
    };
    for (flag, provider, id_var, url_var) in CI_PROVIDERS {
        if get(flag).is_none() {
            continue;
        }
        let build_id = get(id_var);
        let build_url = get(url_var).or_else(|| {
            // GitHub exposes the pieces, not the url
            if *provider != "github-actions" {
                return None;
            }
            Some(format!(
                "{}/{}/actions/runs/{}",
                get("GITHUB_SERVER_URL")?,
                get("GITHUB_REPOSITORY")?,
                build_id.clone()?
            ))
        });
        return Marker::BuildEnvironment {
            provider: provider.to_string(),
            build_id,
            build_url,
        };
    }
    Marker::BuildEnvironment {
        provider: "local".to_string(),
        build_id: None,
        build_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarkerKind, Payload, SourceKind};

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn detects_ci_providers() {
        let m = build_environment(&env(&[
            ("GITHUB_ACTIONS", "true"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_SERVER_URL", "https://github.com"),
            ("GITHUB_REPOSITORY", "acme/app"),
        ]));
        assert_eq!(
            m,
            Marker::BuildEnvironment {
                provider: "github-actions".into(),
                build_id: Some("42".into()),
                build_url: Some("https://github.com/acme/app/actions/runs/42".into()),
            }
        );
        assert!(matches!(
            build_environment(&env(&[])),
            Marker::BuildEnvironment { provider, .. } if provider == "local"
        ));
    }

    #[test]
    fn stamping_is_idempotent_and_keeps_existing_markers() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ProvenanceBundle::collect(dir.path(), None, &env(&[]));
        let unit = SourceUnit::new("a.txt", SourceKind::PlainText, Payload::text("a"))
            .with_marker(Marker::SourceSet { name: "test".into() });

        let once = bundle.stamp(unit);
        let twice = bundle.stamp(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.markers().len(), 6);
        assert_eq!(
            once.markers().get(MarkerKind::SourceSet),
            Some(&Marker::SourceSet { name: "test".into() })
        );
        assert!(matches!(
            once.markers().get(MarkerKind::Project),
            Some(Marker::Project { group, .. }) if group == "standalone"
        ));
    }
}
