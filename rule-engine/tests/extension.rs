use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use artifact_resolver::{
    ArtifactResolver, Coordinate, MemoryFetcher, ModuleId, RemoteRepository, ResolverConfig,
};
use pretty_assertions::assert_eq;
use rule_engine::{ExtensionLoader, RuleRegistry};

const RULES_YML: &str = "\
type: specs.openrewrite.org/v1beta/recipe
name: com.acme.NoTabs
recipeList:
  - rewrite.text.ExpandTabs:
      tabWidth: 2
";

fn repo() -> RemoteRepository {
    RemoteRepository::new("test", "https://repo.test/maven2/")
}

fn resolver(cache: &Path, fetcher: MemoryFetcher) -> ArtifactResolver<MemoryFetcher> {
    ArtifactResolver::new(
        ResolverConfig {
            local_repository: cache.to_path_buf(),
            remotes: vec![repo()],
            concurrency: 2,
        },
        fetcher,
    )
}

fn jar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let opts = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        zip.start_file(*name, opts).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_jar(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(&jar_bytes(entries))
        .unwrap();
    path
}

#[tokio::test]
async fn path_packages_add_a_layer_and_skip_bad_entries() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(
        dir.path(),
        "acme-rules-1.0.jar",
        &[
            ("META-INF/rewrite/rules.yml", RULES_YML),
            (
                "META-INF/maven/com.acme/acme-rules/pom.properties",
                "groupId=com.acme\nartifactId=acme-rules\nversion=1.0\n",
            ),
        ],
    );
    let not_jar = dir.path().join("rules.zip");
    std::fs::write(&not_jar, jar_bytes(&[])).unwrap();
    let missing = dir.path().join("missing.jar");

    let resolver = resolver(&dir.path().join("cache"), MemoryFetcher::new());
    let mut registry = RuleRegistry::with_builtins();
    let entries: Vec<String> = [&jar, &not_jar, &missing]
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let loaded = ExtensionLoader::new(&resolver)
        .load(&entries, &mut registry)
        .await;

    assert_eq!(loaded.packages.len(), 1);
    assert_eq!(
        loaded.packages[0].module,
        Some(ModuleId::new("com.acme", "acme-rules"))
    );
    assert_eq!(loaded.packages[0].rules, ["com.acme.NoTabs"]);
    assert_eq!(loaded.skipped.len(), 2);
    assert!(registry.contains("com.acme.NoTabs"));
    let rule = registry.instantiate("com.acme.NoTabs").unwrap();
    assert_eq!(rule.children()[0].id(), "rewrite.text.ExpandTabs");

    // same module again, other version: not loaded twice
    let again = write_jar(
        dir.path(),
        "acme-rules-1.1.jar",
        &[(
            "META-INF/maven/com.acme/acme-rules/pom.properties",
            "groupId=com.acme\nartifactId=acme-rules\nversion=1.1\n",
        )],
    );
    let loaded = ExtensionLoader::new(&resolver)
        .load(&[again.display().to_string()], &mut registry)
        .await;
    assert!(loaded.packages.is_empty());
    assert_eq!(registry.layers().len(), 2);
}

#[tokio::test]
async fn coordinates_are_resolved_through_the_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MemoryFetcher::new();
    let coord = Coordinate::parse("com.acme:acme-rules:2.0").unwrap();
    fetcher.insert_artifact(
        &repo(),
        &coord,
        jar_bytes(&[("META-INF/rewrite/a.yaml", RULES_YML)]),
    );
    let resolver = resolver(&dir.path().join("cache"), fetcher);

    let mut registry = RuleRegistry::with_builtins();
    let loaded = ExtensionLoader::new(&resolver)
        .load(&["com.acme:acme-rules:2.0"], &mut registry)
        .await;

    assert_eq!(loaded.rule_count(), 1);
    assert_eq!(
        loaded.packages[0].module,
        Some(ModuleId::new("com.acme", "acme-rules"))
    );
    assert!(registry.contains("com.acme.NoTabs"));
}

#[tokio::test]
async fn detached_loading_reports_without_extending_selection() {
    let dir = tempfile::tempdir().unwrap();
    let jar = write_jar(
        dir.path(),
        "rules.jar",
        &[("META-INF/rewrite/rules.yml", RULES_YML)],
    );
    let resolver = resolver(&dir.path().join("cache"), MemoryFetcher::new());
    let mut registry = RuleRegistry::with_builtins();

    let loaded = ExtensionLoader::new(&resolver)
        .extend_host_registry(false)
        .load(&[jar.display().to_string()], &mut registry)
        .await;

    assert!(!loaded.attached);
    assert_eq!(loaded.rule_count(), 1);
    assert!(!registry.contains("com.acme.NoTabs"));
    assert!(registry.contains("rewrite.text.ExpandTabs"));
}

#[tokio::test]
async fn unresolvable_coordinates_leave_host_rules_usable() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = resolver(&dir.path().join("cache"), MemoryFetcher::new());
    let mut registry = RuleRegistry::with_builtins();

    let loaded = ExtensionLoader::new(&resolver)
        .load(&["com.acme:gone:1.0"], &mut registry)
        .await;

    assert!(loaded.packages.is_empty());
    assert_eq!(loaded.skipped.len(), 1);
    assert!(registry.contains("rewrite.text.TrimTrailingWhitespace"));
}
