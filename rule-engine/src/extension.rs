//! Extension loader.
//!
//! Entries are file paths or coordinates. Coordinates are resolved with their
//! transitive closure; every resulting file must be an existing `.jar`.
//! Each package contributes the declarative rules found under
//! `META-INF/rewrite/` as one registry layer on top of the host registry.
//!
//! Compiled rule code inside a package cannot run in this process. Such
//! packages contribute no rules; that is reported, not treated as an error.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use artifact_resolver::{
    ArtifactFetcher, ArtifactResolver, ArtifactSpec, ClasspathAssembler, ModuleId,
};
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

use crate::declarative::{DeclarativeDefinition, parse_definitions};
use crate::registry::{RegistryLayer, RuleRegistry};

const RULE_DIR: &str = "META-INF/rewrite/";
const MAVEN_META_DIR: &str = "META-INF/maven/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPackage {
    pub path: PathBuf,
    pub module: Option<ModuleId>,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedExtension {
    pub entry: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedExtensions {
    pub packages: Vec<LoadedPackage>,
    pub skipped: Vec<SkippedExtension>,
    /// Whether the packages were added to rule selection.
    pub attached: bool,
}

impl LoadedExtensions {
    pub fn rule_count(&self) -> usize {
        self.packages.iter().map(|p| p.rules.len()).sum()
    }
}

#[derive(Debug, Default)]
struct Package {
    module: Option<ModuleId>,
    definitions: Vec<DeclarativeDefinition>,
    classes: usize,
}

pub struct ExtensionLoader<'a, F> {
    assembler: ClasspathAssembler<'a, F>,
    extend_host_registry: bool,
}

impl<'a, F: ArtifactFetcher> ExtensionLoader<'a, F> {
    pub fn new(resolver: &'a ArtifactResolver<F>) -> Self {
        Self {
            assembler: ClasspathAssembler::new(resolver),
            extend_host_registry: true,
        }
    }

    /// When off, packages are read and reported but their rules stay out of
    /// selection.
    pub fn extend_host_registry(mut self, extend: bool) -> Self {
        self.extend_host_registry = extend;
        self
    }

    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn load<S: AsRef<str>>(
        &self,
        entries: &[S],
        registry: &mut RuleRegistry,
    ) -> LoadedExtensions {
        let mut out = LoadedExtensions {
            attached: self.extend_host_registry,
            ..Default::default()
        };
        if entries.is_empty() {
            return out;
        }

        let specs: Vec<ArtifactSpec> = entries
            .iter()
            .map(|e| ArtifactSpec::classify(e.as_ref()))
            .collect();
        for spec in &specs {
            if let ArtifactSpec::Path(p) = spec {
                if !p.is_file() {
                    out.skipped.push(SkippedExtension {
                        entry: p.display().to_string(),
                        reason: "file does not exist".to_string(),
                    });
                }
            }
        }

        let resolution = self.assembler.resolve_extra(&specs).await;
        for failure in resolution.failures {
            warn!("extension: cannot resolve {}: {}", failure.coordinate, failure.error);
            out.skipped.push(SkippedExtension {
                entry: failure.coordinate.to_string(),
                reason: failure.error.to_string(),
            });
        }

        let mut seen: HashSet<ModuleId> = HashSet::new();
        let mut compiled_only = 0usize;
        for entry in resolution.classpath.entries() {
            let shown = entry.path.display().to_string();
            if !has_jar_extension(&entry.path) {
                warn!("extension: {shown} is not a .jar, skipped");
                out.skipped.push(SkippedExtension {
                    entry: shown,
                    reason: "not a .jar package".to_string(),
                });
                continue;
            }

            let package = match read_package(&entry.path) {
                Ok(p) => p,
                Err(reason) => {
                    warn!("extension: cannot read {shown}: {reason}");
                    out.skipped.push(SkippedExtension {
                        entry: shown,
                        reason,
                    });
                    continue;
                }
            };

            let module = entry
                .coordinate
                .as_ref()
                .map(|c| c.module_id())
                .or(package.module);
            if let Some(m) = &module {
                if registry.has_module(m) || !seen.insert(m.clone()) {
                    debug!("extension: {m} already visible, not loaded again");
                    out.skipped.push(SkippedExtension {
                        entry: shown,
                        reason: format!("{m} already loaded"),
                    });
                    continue;
                }
            }

            if package.definitions.is_empty() && package.classes > 0 {
                compiled_only += 1;
            }

            let name = match (&entry.coordinate, &module) {
                (Some(c), _) => c.to_string(),
                (None, Some(m)) => m.to_string(),
                (None, None) => shown.clone(),
            };
            let mut layer = RegistryLayer::from_definitions(name.clone(), package.definitions);
            if let Some(m) = &module {
                layer = layer.with_module(m.clone());
            }
            let rules: Vec<String> = layer.ids().map(str::to_string).collect();

            if self.extend_host_registry {
                registry.push_layer(layer);
            } else if !rules.is_empty() {
                info!("extension: would add {} rule(s) from {name}", rules.len());
            }
            out.packages.push(LoadedPackage {
                path: entry.path.clone(),
                module,
                rules,
            });
        }

        if compiled_only > 0 {
            warn!(
                "extension: {compiled_only} package(s) hold only compiled rule code, \
                 which cannot be loaded here; their rules are unavailable"
            );
        }
        info!(
            "extension: {} package(s), {} rule(s), {} skipped",
            out.packages.len(),
            out.rule_count(),
            out.skipped.len()
        );
        out
    }
}

fn has_jar_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jar"))
}

fn read_package(path: &Path) -> Result<Package, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = ZipArchive::new(file).map_err(|e| e.to_string())?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let mut package = Package {
        classes: names.iter().filter(|n| n.ends_with(".class")).count(),
        ..Default::default()
    };

    let pom_properties: Vec<&String> = names
        .iter()
        .filter(|n| n.starts_with(MAVEN_META_DIR) && n.ends_with("/pom.properties"))
        .collect();
    // shaded jars carry several; none of them identifies the package
    if let [single] = pom_properties.as_slice() {
        package.module = module_from_pom_properties(&read_entry(&mut archive, single)?);
    }

    let mut rule_files: Vec<&String> = names
        .iter()
        .filter(|n| n.starts_with(RULE_DIR) && (n.ends_with(".yml") || n.ends_with(".yaml")))
        .collect();
    rule_files.sort();
    for name in rule_files {
        let origin = format!("{}!/{name}", path.display());
        let text = read_entry(&mut archive, name)?;
        match parse_definitions(&text, &origin) {
            Ok(defs) => package.definitions.extend(defs),
            Err(err) => warn!("extension: {err}"),
        }
    }
    Ok(package)
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<String, String> {
    let mut entry = archive.by_name(name).map_err(|e| e.to_string())?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| format!("{name}: {e}"))?;
    Ok(text)
}

fn module_from_pom_properties(text: &str) -> Option<ModuleId> {
    let value = |key: &str| {
        text.lines()
            .filter_map(|l| l.split_once('='))
            .find(|(k, _)| k.trim() == key)
            .map(|(_, v)| v.trim().to_string())
    };
    Some(ModuleId::new(value("groupId")?, value("artifactId")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pom_properties_identify_the_module() {
        let text = "#Generated\nversion=1.2.0\ngroupId=com.acme\nartifactId=acme-rules\n";
        assert_eq!(
            module_from_pom_properties(text),
            Some(ModuleId::new("com.acme", "acme-rules"))
        );
        assert_eq!(module_from_pom_properties("version=1\n"), None);
    }

    #[test]
    fn jar_extension_check_ignores_case() {
        assert!(has_jar_extension(Path::new("a/B.JAR")));
        assert!(!has_jar_extension(Path::new("a/b.zip")));
    }
}
