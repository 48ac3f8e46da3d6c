//! Index of type names available on the resolved classpath.
//!
//! Compiled-language parsing uses it to report imports whose types cannot be
//! found. An incomplete classpath only makes that report longer.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use artifact_resolver::ResolvedClasspath;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Namespaces provided by the runtimes themselves.
const PLATFORM_PREFIXES: &[&str] = &["java.", "javax.", "jdk.", "sun.", "kotlin."];

#[derive(Debug, Default)]
pub struct TypeIndex {
    types: HashSet<String>,
    packages: HashSet<String>,
    unreadable: Vec<PathBuf>,
}

impl TypeIndex {
    pub fn from_classpath(classpath: &ResolvedClasspath) -> Self {
        let paths: Vec<&Path> = classpath.paths().collect();
        let scanned: Vec<(PathBuf, Result<Vec<String>, String>)> = paths
            .par_iter()
            .map(|p| (p.to_path_buf(), class_names(p)))
            .collect();

        let mut index = TypeIndex::default();
        for (path, result) in scanned {
            match result {
                Ok(names) => {
                    debug!("type_index: {} types from {}", names.len(), path.display());
                    for name in names {
                        index.insert(name);
                    }
                }
                Err(reason) => {
                    warn!("type_index: cannot read {}: {reason}", path.display());
                    index.unreadable.push(path);
                }
            }
        }
        info!(
            "type_index: {} types in {} packages ({} unreadable entries)",
            index.types.len(),
            index.packages.len(),
            index.unreadable.len()
        );
        index
    }

    pub fn insert(&mut self, fqn: String) {
        if let Some((pkg, _)) = fqn.rsplit_once('.') {
            self.packages.insert(pkg.to_string());
        }
        self.types.insert(fqn);
    }

    /// Whether `name` resolves as a type (or, with `package`, as a package).
    /// Platform namespaces always resolve.
    pub fn knows(&self, name: &str, package: bool) -> bool {
        if PLATFORM_PREFIXES.iter().any(|p| name.starts_with(p)) {
            return true;
        }
        if package {
            self.packages.contains(name) || self.types.contains(name)
        } else {
            self.types.contains(name)
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }
}

fn class_names(path: &Path) -> Result<Vec<String>, String> {
    if path.is_dir() {
        let names = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(path).ok()?.to_string_lossy().replace('\\', "/");
                class_entry_to_fqn(&rel)
            })
            .collect();
        return Ok(names);
    }

    let file = File::open(path).map_err(|e| e.to_string())?;
    let archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    Ok(archive.file_names().filter_map(class_entry_to_fqn).collect())
}

/// `org/example/Outer$Inner.class` -> `org.example.Outer.Inner`. Anonymous
/// classes and `module-info`/`package-info` are skipped.
fn class_entry_to_fqn(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(".class")?;
    let stem = stem.strip_prefix("META-INF/versions/").map_or(stem, |rest| {
        rest.split_once('/').map_or(rest, |(_, s)| s)
    });
    if stem.ends_with("module-info") || stem.ends_with("package-info") {
        return None;
    }
    if stem
        .split('$')
        .skip(1)
        .any(|part| part.chars().next().is_some_and(|c| c.is_ascii_digit()))
    {
        return None;
    }
    Some(stem.replace(['/', '$'], "."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn class_entries_map_to_type_names() {
        assert_eq!(
            class_entry_to_fqn("org/example/Outer$Inner.class").as_deref(),
            Some("org.example.Outer.Inner")
        );
        assert_eq!(
            class_entry_to_fqn("META-INF/versions/11/org/example/A.class").as_deref(),
            Some("org.example.A")
        );
        assert_eq!(class_entry_to_fqn("org/example/A$1.class"), None);
        assert_eq!(class_entry_to_fqn("module-info.class"), None);
        assert_eq!(class_entry_to_fqn("org/example/readme.txt"), None);
    }

    #[test]
    fn indexes_jars_and_tolerates_broken_ones() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.jar");
        let mut zip = zip::ZipWriter::new(File::create(&jar).unwrap());
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("org/lib/Widget.class", opts).unwrap();
        zip.write_all(b"\xCA\xFE\xBA\xBE").unwrap();
        zip.finish().unwrap();
        let broken = dir.path().join("broken.jar");
        std::fs::write(&broken, b"not a zip").unwrap();

        let mut cp = ResolvedClasspath::default();
        for path in [jar, broken.clone()] {
            cp.push(artifact_resolver::ClasspathEntry {
                coordinate: None,
                path,
                depth: 0,
            });
        }
        let index = TypeIndex::from_classpath(&cp);

        assert!(index.knows("org.lib.Widget", false));
        assert!(index.knows("org.lib", true));
        assert!(index.knows("java.util.List", false));
        assert!(!index.knows("org.other.Thing", false));
        assert_eq!(index.unreadable(), &[broken]);
    }
}
