use std::fs;
use std::path::Path;

use artifact_resolver::MemoryFetcher;
use pretty_assertions::assert_eq;
use rewrite_runner::{RunConfig, RunnerError, execute_with};
use rule_engine::{FieldConfigError, RuleError};

fn config(root: &Path, cache: &Path) -> RunConfig {
    let mut cfg = RunConfig {
        project_root: root.to_path_buf(),
        ..Default::default()
    };
    cfg.resolver.local_repository = Some(cache.to_path_buf());
    cfg.resolver.remotes = vec!["https://repo.test/maven2/".into()];
    cfg
}

#[tokio::test]
async fn whitespace_rule_gives_one_hunk_then_nothing() {
    let project = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let root = project.path();
    fs::write(root.join("notes.txt"), "first  \nsecond\n").unwrap();

    let mut cfg = config(root, cache.path());
    cfg.rules = vec!["rewrite.text.TrimTrailingWhitespace".into()];

    let report = execute_with(&cfg, MemoryFetcher::new()).await.unwrap();
    assert_eq!(report.classification.modified.len(), 1);
    assert_eq!(report.classification.len(), 1);

    let patch = fs::read_to_string(report.patch.unwrap()).unwrap();
    assert_eq!(patch.matches("\n@@ ").count(), 1);
    assert!(patch.contains("-first  \n+first\n"));
    // dry run leaves the project alone
    assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "first  \nsecond\n");

    // apply, then run again over the patched tree
    cfg.dry_run = false;
    let applied = execute_with(&cfg, MemoryFetcher::new()).await.unwrap();
    assert_eq!(applied.applied.unwrap().written.len(), 1);
    assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "first\nsecond\n");

    cfg.dry_run = true;
    let again = execute_with(&cfg, MemoryFetcher::new()).await.unwrap();
    assert!(again.classification.is_empty());
}

#[tokio::test]
async fn unknown_rule_fails_before_touching_the_project() {
    let project = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let root = project.path();
    fs::write(
        root.join("pom.xml"),
        "<project><groupId>g</groupId><artifactId>a</artifactId><version>1</version>\
         <dependencies><dependency><groupId>g</groupId><artifactId>dep</artifactId>\
         <version>1.0</version></dependency></dependencies></project>",
    )
    .unwrap();

    let mut cfg = config(root, cache.path());
    cfg.rules = vec!["org.example.DoesNotExist".into()];
    let fetcher = MemoryFetcher::new();

    let err = execute_with(&cfg, fetcher).await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Rule(RuleError::SelectionFailure { ref id }) if id == "org.example.DoesNotExist"
    ));
    assert!(!root.join("target").exists());
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_option_keys_are_fatal_and_listed() {
    let project = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    fs::write(project.path().join("a.txt"), "foo\n").unwrap();

    let mut cfg = config(project.path(), cache.path());
    cfg.rules = vec!["rewrite.text.FindAndReplace".into()];
    cfg.options = vec!["find=foo".into(), "shade=blue".into()];

    let err = execute_with(&cfg, MemoryFetcher::new()).await.unwrap_err();
    match err {
        RunnerError::Rule(RuleError::FieldConfiguration(FieldConfigError::UnknownFields {
            keys,
            ..
        })) => assert_eq!(keys, ["shade"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!project.path().join("target").exists());
}

#[tokio::test]
async fn string_and_boolean_options_drive_the_rule() {
    let project = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    fs::write(project.path().join("a.txt"), "v1.2 and v3.4\n").unwrap();

    let mut cfg = config(project.path(), cache.path());
    cfg.rules = vec!["rewrite.text.FindAndReplace".into()];
    cfg.options = vec![
        r"find=v(\d)\.(\d)".into(),
        "replace=v${1}_${2}".into(),
        "regex=true".into(),
    ];
    cfg.dry_run = false;

    let report = execute_with(&cfg, MemoryFetcher::new()).await.unwrap();
    assert_eq!(report.classification.modified.len(), 1);
    assert_eq!(
        fs::read_to_string(project.path().join("a.txt")).unwrap(),
        "v1_2 and v3_4\n"
    );
}

#[tokio::test]
async fn project_rules_file_runs_all_its_rules_by_default() {
    let project = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let root = project.path();
    fs::write(root.join("a.txt"), "\tindented").unwrap();
    fs::write(
        root.join("rewrite.yml"),
        "type: specs.openrewrite.org/v1beta/recipe\n\
         name: com.acme.Tidy\n\
         recipeList:\n\
         \x20 - rewrite.text.ExpandTabs:\n\
         \x20     tabWidth: 2\n\
         \x20 - rewrite.text.EnsureFinalNewline\n",
    )
    .unwrap();

    let mut cfg = config(root, cache.path());
    cfg.dry_run = false;
    let report = execute_with(&cfg, MemoryFetcher::new()).await.unwrap();

    assert_eq!(report.classification.modified.len(), 1);
    assert_eq!(
        report.classification.modified[0].rules,
        ["rewrite.text.ExpandTabs", "rewrite.text.EnsureFinalNewline"]
    );
    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "  indented\n");
}
