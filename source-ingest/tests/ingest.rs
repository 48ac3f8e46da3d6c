use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use artifact_resolver::ResolvedClasspath;
use pretty_assertions::assert_eq;
use source_ingest::model::{MarkerKind, OpaqueReason, Payload, SourceKind, Syntax};
use source_ingest::{IngestConfig, ProvenanceBundle, ingest};

fn write(root: &Path, rel: &str, body: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn run(root: &Path, cfg: &IngestConfig) -> source_ingest::IngestOutput {
    let provenance = ProvenanceBundle::collect(root, None, &BTreeMap::new());
    ingest(root, cfg, &ResolvedClasspath::default(), &provenance).unwrap()
}

#[test]
fn units_follow_discovery_order_and_skip_pruned_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "pom.xml", b"<project/>");
    write(root, "src/main/java/com/acme/App.java", b"package com.acme;\nclass App {}\n");
    write(root, "src/main/resources/app.yml", b"a: 1\n");
    write(root, "README.md", b"# readme\n");
    write(root, "target/classes/Gen.java", b"class Gen {}");
    write(root, ".idea/workspace.xml", b"<x/>");
    write(root, "logo.png", b"\x89PNG");

    let out = run(root, &IngestConfig::default());
    let paths: Vec<PathBuf> = out.units.iter().map(|u| u.path().to_path_buf()).collect();
    assert_eq!(
        paths,
        [
            "README.md",
            "pom.xml",
            "src/main/java/com/acme/App.java",
            "src/main/resources/app.yml",
        ]
        .map(PathBuf::from)
    );
    assert_eq!(out.units[1].kind(), SourceKind::BuildDescriptor);
    assert!(out.failures.is_empty());
    assert_eq!(out.stats.discovered, 5);
}

#[test]
fn size_threshold_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "at.txt", b"0123456789");
    write(dir.path(), "over.txt", b"0123456789A");

    let mut cfg = IngestConfig::default();
    cfg.limits.size_threshold_bytes = 10;
    let out = run(dir.path(), &cfg);

    assert_eq!(out.units[0].text(), Some("0123456789"));
    assert_eq!(
        out.units[1].payload(),
        &Payload::Opaque {
            size: 11,
            reason: OpaqueReason::Oversized
        }
    );
    assert_eq!(out.units[1].syntax(), None);
    assert_eq!(out.stats.oversized, 1);
}

#[test]
fn parse_failures_degrade_without_aborting_the_group() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a/Broken.java", b"public class Broken { void m( }");
    write(dir.path(), "b/Fine.java", b"public class Fine {}");
    write(dir.path(), "c.json", b"{");

    let out = run(dir.path(), &IngestConfig::default());

    assert_eq!(out.units.len(), 3);
    assert!(out.units[0].is_opaque());
    assert!(matches!(
        out.units[0].payload(),
        Payload::Opaque { reason: OpaqueReason::Unparseable(_), .. }
    ));
    assert!(matches!(out.units[1].syntax(), Some(Syntax::Compiled { .. })));
    assert!(out.units[2].is_opaque());
    let failed: Vec<PathBuf> = out.failures.iter().map(|f| f.path.clone()).collect();
    assert_eq!(failed, [PathBuf::from("a/Broken.java"), PathBuf::from("c.json")]);
}

#[test]
fn imports_without_type_information_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/com/acme/App.java",
        b"package com.acme;\n\
          import java.util.List;\n\
          import com.acme.util.Helper;\n\
          import com.acme.util.Helper.Nested;\n\
          import org.missing.Thing;\n\
          public class App {}\n",
    );
    write(
        dir.path(),
        "src/com/acme/util/Helper.java",
        b"package com.acme.util;\npublic class Helper {}\n",
    );

    let out = run(dir.path(), &IngestConfig::default());
    let app = &out.units[0];
    match app.syntax() {
        Some(Syntax::Compiled { missing_types, .. }) => {
            assert_eq!(missing_types, &["org.missing.Thing".to_string()]);
        }
        other => panic!("unexpected syntax {other:?}"),
    }
    assert_eq!(out.stats.missing_types, 1);
}

#[test]
fn every_unit_is_stamped_once_per_marker_kind() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.properties", b"k=v\n");
    write(dir.path(), "b.txt", b"\x00\x01binary");

    let out = run(dir.path(), &IngestConfig::default());
    for unit in &out.units {
        assert_eq!(unit.markers().len(), 6);
        assert!(unit.markers().get(MarkerKind::BuildEnvironment).is_some());
    }
    assert!(matches!(out.units[1].payload(), Payload::Bytes { .. }));
}

#[test]
fn missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let provenance = ProvenanceBundle::collect(dir.path(), None, &BTreeMap::new());
    let err = ingest(
        &dir.path().join("nope"),
        &IngestConfig::default(),
        &ResolvedClasspath::default(),
        &provenance,
    )
    .unwrap_err();
    assert!(matches!(err, source_ingest::IngestError::RootMissing(_)));
}
