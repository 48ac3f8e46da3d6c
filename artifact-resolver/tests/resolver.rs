use std::path::Path;

use artifact_resolver::{
    ArtifactResolver, ClasspathAssembler, Coordinate, DependencyEdge, DescriptorError,
    DescriptorLoader, LoadOptions, MemoryFetcher, RemoteRepository, ResolveError, ResolverConfig,
    Scope,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const JAR: &[u8] = b"PK\x03\x04fake-jar";

fn repo() -> RemoteRepository {
    RemoteRepository::new("test", "https://repo.test/maven2/")
}

fn resolver(cache: &Path, fetcher: MemoryFetcher) -> ArtifactResolver<MemoryFetcher> {
    let config = ResolverConfig {
        local_repository: cache.to_path_buf(),
        remotes: vec![repo()],
        concurrency: 4,
    };
    ArtifactResolver::new(config, fetcher)
}

fn dep(g: &str, a: &str, v: &str, extra: &str) -> String {
    format!(
        "<dependency><groupId>{g}</groupId><artifactId>{a}</artifactId><version>{v}</version>{extra}</dependency>"
    )
}

fn pom(g: &str, a: &str, v: &str, body: &str) -> String {
    format!(
        "<project><modelVersion>4.0.0</modelVersion><groupId>{g}</groupId><artifactId>{a}</artifactId><version>{v}</version>{body}</project>"
    )
}

/// Publish a jar and a pom declaring `deps` as its dependencies.
fn publish(fetcher: &MemoryFetcher, coord: &str, deps: &[String]) {
    let c = Coordinate::parse(coord).unwrap();
    let body = format!("<dependencies>{}</dependencies>", deps.concat());
    fetcher.insert_artifact(&repo(), &c, JAR);
    fetcher.insert_artifact(
        &repo(),
        &c.pom(),
        pom(c.group(), c.name(), c.version(), &body),
    );
}

fn names(resolution: &artifact_resolver::Resolution) -> Vec<String> {
    resolution
        .classpath
        .entries()
        .iter()
        .filter_map(|e| e.coordinate.as_ref())
        .map(|c| c.to_string())
        .collect()
}

#[tokio::test]
async fn transitive_closure_keeps_declaration_order() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[dep("g", "b", "2.0", "")]);
    publish(&fetcher, "g:b:2.0", &[]);

    let resolver = resolver(cache.path(), fetcher);
    let root = DependencyEdge::new(Coordinate::parse("g:a:1.0").unwrap(), Scope::Compile);
    let resolution = resolver.resolve_transitive(&[root]).await;

    assert!(resolution.is_complete());
    assert_eq!(names(&resolution), vec!["g:a:1.0", "g:b:2.0"]);
    for entry in resolution.classpath.entries() {
        assert!(entry.path.starts_with(cache.path()));
        assert_eq!(std::fs::read(&entry.path).unwrap(), JAR);
    }
}

#[tokio::test]
async fn shallower_version_wins_over_deeper_one() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[dep("g", "b", "2.0", "")]);
    publish(&fetcher, "g:b:2.0", &[]);
    publish(&fetcher, "g:b:3.0", &[]);

    let resolver = resolver(cache.path(), fetcher);
    let roots = [
        DependencyEdge::new(Coordinate::parse("g:a:1.0").unwrap(), Scope::Compile),
        DependencyEdge::new(Coordinate::parse("g:b:3.0").unwrap(), Scope::Compile),
    ];
    let resolution = resolver.resolve_transitive(&roots).await;

    assert_eq!(names(&resolution), vec!["g:a:1.0", "g:b:3.0"]);
}

#[tokio::test]
async fn optional_test_and_excluded_children_are_not_followed() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(
        &fetcher,
        "g:a:1.0",
        &[
            dep("g", "opt", "1.0", "<optional>true</optional>"),
            dep("g", "junit", "1.0", "<scope>test</scope>"),
            dep("g", "drop", "1.0", ""),
            dep("g", "keep", "1.0", "<scope>runtime</scope>"),
        ],
    );
    publish(&fetcher, "g:keep:1.0", &[]);

    let resolver = resolver(cache.path(), fetcher);
    let root = DependencyEdge::new(Coordinate::parse("g:a:1.0").unwrap(), Scope::Compile)
        .with_exclusions(vec![artifact_resolver::Exclusion::new("g", "drop")]);
    let resolution = resolver.resolve_transitive(&[root]).await;

    assert!(resolution.is_complete());
    assert_eq!(names(&resolution), vec!["g:a:1.0", "g:keep:1.0"]);
}

#[tokio::test]
async fn missing_artifacts_produce_a_partial_classpath() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[dep("g", "gone", "1.0", "")]);

    let resolver = resolver(cache.path(), fetcher);
    let root = DependencyEdge::new(Coordinate::parse("g:a:1.0").unwrap(), Scope::Compile);
    let resolution = resolver.resolve_transitive(&[root]).await;

    assert_eq!(names(&resolution), vec!["g:a:1.0"]);
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].coordinate.to_string(), "g:gone:1.0");
    assert!(matches!(
        resolution.failures[0].error,
        ResolveError::ArtifactNotFound { .. }
    ));
}

#[tokio::test]
async fn second_resolution_is_served_from_cache() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[]);
    let resolver = resolver(cache.path(), fetcher);
    let c = Coordinate::parse("g:a:1.0").unwrap();

    let first = resolver.resolve(&c).await.unwrap();
    let requests = resolver.fetcher().requests();
    let second = resolver.resolve(&c).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(resolver.fetcher().requests(), requests);
}

#[tokio::test]
async fn fetch_locks_are_released_once_resolution_ends() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[]);
    let resolver = resolver(cache.path(), fetcher);

    resolver.resolve(&Coordinate::parse("g:a:1.0").unwrap()).await.unwrap();
    assert!(resolver.resolve(&Coordinate::parse("g:gone:1.0").unwrap()).await.is_err());
    assert_eq!(resolver.pending_fetches(), 0);
}

#[tokio::test]
async fn shared_dependency_reached_twice_is_listed_once() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[dep("g", "c", "1.0", "")]);
    publish(&fetcher, "g:b:1.0", &[dep("g", "c", "1.0", "")]);
    publish(&fetcher, "g:c:1.0", &[]);
    let resolver = resolver(cache.path(), fetcher);

    let edges = ["g:a:1.0", "g:b:1.0"]
        .map(|c| DependencyEdge::new(Coordinate::parse(c).unwrap(), Scope::Compile));
    let resolution = resolver.resolve_transitive(&edges).await;
    assert_eq!(names(&resolution), ["g:a:1.0", "g:b:1.0", "g:c:1.0"]);
}

#[tokio::test]
async fn checksum_and_layout_mismatches_are_corrupt() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    let bad_sum = Coordinate::parse("g:sum:1.0").unwrap();
    let url = repo().artifact_url(&bad_sum);
    fetcher.insert(&url, JAR);
    fetcher.insert(format!("{url}.sha256"), "00ff  sum-1.0.jar");
    let not_zip = Coordinate::parse("g:html:1.0").unwrap();
    fetcher.insert_artifact(&repo(), &not_zip, "<html>proxy login</html>");

    let resolver = resolver(cache.path(), fetcher);
    for c in [&bad_sum, &not_zip] {
        let err = resolver.resolve(c).await.unwrap_err();
        assert!(matches!(err, ResolveError::ArtifactCorrupt { .. }), "{err}");
        assert!(!resolver.local().path_for(c).exists());
    }
}

#[tokio::test]
async fn matching_checksum_is_accepted() {
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    let c = Coordinate::parse("g:sum:1.0").unwrap();
    let url = repo().artifact_url(&c);
    fetcher.insert(&url, JAR);
    fetcher.insert(
        format!("{url}.sha256"),
        artifact_resolver::resolver::sha256_hex(JAR),
    );

    let resolver = resolver(cache.path(), fetcher);
    assert!(resolver.resolve(&c).await.is_ok());
}

#[tokio::test]
async fn effective_model_applies_parent_properties_profiles_and_boms() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();

    // remote parent with a property and a managed version
    let parent = Coordinate::parse("org.corp:corp-parent:pom:7").unwrap();
    fetcher.insert_artifact(
        &repo(),
        &parent,
        pom(
            "org.corp",
            "corp-parent",
            "7",
            &format!(
                "<packaging>pom</packaging><properties><lib.version>4.2</lib.version></properties>\
                 <dependencyManagement><dependencies>{}{}</dependencies></dependencyManagement>",
                dep("org.lib", "lib", "${lib.version}", ""),
                dep("org.bom", "bom", "1.0", "<type>pom</type><scope>import</scope>"),
            ),
        ),
    );
    let bom = Coordinate::parse("org.bom:bom:pom:1.0").unwrap();
    fetcher.insert_artifact(
        &repo(),
        &bom,
        pom(
            "org.bom",
            "bom",
            "1.0",
            &format!(
                "<dependencyManagement><dependencies>{}</dependencies></dependencyManagement>",
                dep("org.managed", "managed", "9.9", "")
            ),
        ),
    );

    std::fs::write(
        project.path().join("pom.xml"),
        format!(
            r#"<project>
  <parent><groupId>org.corp</groupId><artifactId>corp-parent</artifactId><version>7</version></parent>
  <artifactId>app</artifactId>
  <properties><maven.compiler.release>17</maven.compiler.release></properties>
  <dependencies>
    <dependency><groupId>org.lib</groupId><artifactId>lib</artifactId></dependency>
    <dependency><groupId>org.managed</groupId><artifactId>managed</artifactId></dependency>
    <dependency><groupId>${{project.groupId}}</groupId><artifactId>sibling</artifactId><version>${{project.version}}</version></dependency>
    {junit}
  </dependencies>
  <profiles>
    <profile>
      <id>extra</id>
      <activation><property><name>withExtra</name></property></activation>
      <dependencies>{extra}</dependencies>
    </profile>
  </profiles>
</project>"#,
            junit = dep("junit", "junit", "4.13", "<scope>test</scope>"),
            extra = dep("org.extra", "extra", "1.0", ""),
        ),
    )
    .unwrap();

    let resolver = resolver(cache.path(), fetcher);
    let mut options = LoadOptions::default();
    options
        .user_properties
        .insert("withExtra".into(), "yes".into());
    let loader = DescriptorLoader::new(&resolver, &options);
    let model = loader.load(&project.path().join("pom.xml")).await.unwrap();

    let deps: Vec<String> = model
        .dependencies
        .iter()
        .map(|d| format!("{}@{}", d.coordinate, d.scope))
        .collect();
    assert_eq!(
        deps,
        vec![
            "org.lib:lib:4.2@compile",
            "org.managed:managed:9.9@compile",
            "org.corp:sibling:7@compile",
            "junit:junit:4.13@test",
            "org.extra:extra:1.0@compile",
        ]
    );
    assert_eq!(model.java_release(), Some("17"));
    assert_eq!(model.active_profiles, vec!["extra"]);
    assert_eq!(
        model.project_coordinate().map(|c| c.to_string()),
        Some("org.corp:app:7".to_string())
    );
}

#[tokio::test]
async fn local_parent_is_found_through_relative_path() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("pom.xml"),
        pom(
            "org.corp",
            "root",
            "1.0",
            "<properties><shared.version>3.0</shared.version></properties>",
        ),
    )
    .unwrap();
    let module = project.path().join("module");
    std::fs::create_dir(&module).unwrap();
    std::fs::write(
        module.join("pom.xml"),
        format!(
            "<project><parent><groupId>org.corp</groupId><artifactId>root</artifactId><version>1.0</version></parent>\
             <artifactId>module</artifactId><dependencies>{}</dependencies></project>",
            dep("org.shared", "shared", "${shared.version}", "")
        ),
    )
    .unwrap();

    let resolver = resolver(cache.path(), MemoryFetcher::new());
    let options = LoadOptions::default();
    let model = DescriptorLoader::new(&resolver, &options)
        .load(&module.join("pom.xml"))
        .await
        .unwrap();
    assert_eq!(model.dependencies[0].coordinate.to_string(), "org.shared:shared:3.0");
    assert_eq!(resolver.fetcher().requests(), 0);
}

#[tokio::test]
async fn project_version_placeholders_are_expanded() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    std::fs::write(
        project.path().join("pom.xml"),
        pom(
            "org.corp",
            "app",
            "${revision}${changelist}",
            "<properties><revision>2.1</revision><changelist>-SNAPSHOT</changelist></properties>",
        ),
    )
    .unwrap();

    let resolver = resolver(cache.path(), MemoryFetcher::new());
    let mut options = LoadOptions::default();
    options.user_properties.insert("changelist".into(), String::new());
    let model = DescriptorLoader::new(&resolver, &options)
        .load(&project.path().join("pom.xml"))
        .await
        .unwrap();

    assert_eq!(model.version.as_deref(), Some("2.1"));
    assert_eq!(
        model.project_coordinate().map(|c| c.to_string()).as_deref(),
        Some("org.corp:app:2.1")
    );
}

#[tokio::test]
async fn descriptor_failures_are_fatal() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let resolver = resolver(cache.path(), MemoryFetcher::new());
    let options = LoadOptions::default();
    let loader = DescriptorLoader::new(&resolver, &options);

    let missing = loader.load(&project.path().join("pom.xml")).await;
    assert!(matches!(missing, Err(DescriptorError::DescriptorInvalid { .. })));

    let path = project.path().join("pom.xml");
    std::fs::write(&path, "<project><dependencies>").unwrap();
    assert!(matches!(
        loader.load(&path).await,
        Err(DescriptorError::DescriptorInvalid { .. })
    ));

    std::fs::write(
        &path,
        "<project><parent><groupId>x</groupId><artifactId>nowhere</artifactId><version>1</version></parent>\
         <artifactId>app</artifactId></project>",
    )
    .unwrap();
    assert!(matches!(
        loader.load(&path).await,
        Err(DescriptorError::MissingParent { .. })
    ));

    std::fs::write(
        &path,
        pom("g", "app", "1", &format!("<dependencies>{}</dependencies>", dep("g", "x", "${undefined}", ""))),
    )
    .unwrap();
    assert!(matches!(
        loader.load(&path).await,
        Err(DescriptorError::DescriptorInvalid { .. })
    ));
}

#[tokio::test]
async fn assembler_leaves_test_scope_out_and_pins_managed_versions() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let fetcher = MemoryFetcher::new();
    publish(&fetcher, "g:a:1.0", &[dep("g", "b", "1.0", "")]);
    publish(&fetcher, "g:b:5.0", &[]);
    publish(&fetcher, "g:t:1.0", &[]);

    std::fs::write(
        project.path().join("pom.xml"),
        pom(
            "p",
            "app",
            "1",
            &format!(
                "<dependencyManagement><dependencies>{}</dependencies></dependencyManagement>\
                 <dependencies>{}{}</dependencies>",
                dep("g", "b", "5.0", ""),
                dep("g", "a", "1.0", ""),
                dep("g", "t", "1.0", "<scope>test</scope>"),
            ),
        ),
    )
    .unwrap();

    let resolver = resolver(cache.path(), fetcher);
    let options = LoadOptions::default();
    let model = DescriptorLoader::new(&resolver, &options)
        .load(&project.path().join("pom.xml"))
        .await
        .unwrap();
    let resolution = ClasspathAssembler::new(&resolver).assemble(&model).await;

    assert!(resolution.is_complete());
    assert_eq!(names(&resolution), vec!["g:a:1.0", "g:b:5.0"]);
}
