use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use realign_core::coordinate::ProjectRef;
use realign_ops::ops_align::{run_alignment, AlignOptions};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn reactor() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "pom.xml",
        r#"<project>
    <groupId>org.foo</groupId>
    <artifactId>parent</artifactId>
    <version>2.0</version>
    <packaging>pom</packaging>
    <properties><baz.version>1.0</baz.version></properties>
    <modules><module>bar</module></modules>
    <repositories>
        <repository><id>internal</id><url>https://repo.example/internal</url></repository>
    </repositories>
</project>"#,
    );
    write(
        tmp.path(),
        "bar/pom.xml",
        r#"<project>
    <parent><groupId>org.foo</groupId><artifactId>parent</artifactId><version>2.0</version></parent>
    <artifactId>bar</artifactId>
    <dependencies>
        <dependency><groupId>org.foo</groupId><artifactId>baz</artifactId><version>${baz.version}</version></dependency>
        <dependency><groupId>com.x</groupId><artifactId>y</artifactId><version>1.0</version></dependency>
    </dependencies>
</project>"#,
    );
    write(
        tmp.path(),
        "boms/first.xml",
        r#"<project>
    <groupId>org.prod</groupId><artifactId>first</artifactId><version>1</version>
    <dependencyManagement><dependencies>
        <dependency><groupId>org.foo</groupId><artifactId>baz</artifactId><version>1.0.redhat-1</version></dependency>
    </dependencies></dependencyManagement>
</project>"#,
    );
    write(
        tmp.path(),
        "boms/second.xml",
        r#"<project>
    <groupId>org.prod</groupId><artifactId>second</artifactId><version>1</version>
    <dependencyManagement><dependencies>
        <dependency><groupId>org.foo</groupId><artifactId>baz</artifactId><version>1.0.redhat-9</version></dependency>
        <dependency><groupId>com.x</groupId><artifactId>y</artifactId><version>1.0.redhat-2</version></dependency>
    </dependencies></dependencyManagement>
</project>"#,
    );
    tmp
}

#[test]
fn aligns_with_first_bom_winning() {
    let tmp = reactor();
    let opts = AlignOptions {
        boms: vec![
            tmp.path().join("boms/first.xml"),
            tmp.path().join("boms/second.xml"),
        ],
        ..Default::default()
    };
    let run = run_alignment(tmp.path(), &opts).unwrap();

    assert_eq!(run.changed.len(), 2);
    assert_eq!(run.aligned.projects[0].model.properties["baz.version"], "1.0.redhat-1");
    assert_eq!(run.original.projects[0].model.properties["baz.version"], "1.0");

    let bar = run.aligned.find(&ProjectRef::new("org.foo", "bar")).unwrap();
    let deps = &run.aligned.projects[bar].model.dependencies;
    assert_eq!(deps[0].version.as_deref(), Some("${baz.version}"));
    assert_eq!(deps[1].version.as_deref(), Some("1.0.redhat-2"));

    assert_eq!(run.report.dependency_changes(), 1);
    assert!(run.aligned.projects[0].model.repositories.len() == 1);
}

#[test]
fn user_properties_drive_rules_and_removal() {
    let tmp = reactor();
    let mut user_properties = BTreeMap::new();
    user_properties.insert("dependencyOverride.com.x:y@*".to_string(), String::new());
    user_properties.insert("repoReportingRemoval".to_string(), "true".to_string());
    let opts = AlignOptions {
        boms: vec![tmp.path().join("boms/second.xml")],
        user_properties,
        ..Default::default()
    };
    let run = run_alignment(tmp.path(), &opts).unwrap();

    let bar = run.aligned.find(&ProjectRef::new("org.foo", "bar")).unwrap();
    assert_eq!(
        run.aligned.projects[bar].model.dependencies[1].version.as_deref(),
        Some("1.0")
    );
    assert!(run.aligned.projects[0].model.repositories.is_empty());
    assert!(run.config.remove_repositories_and_reporting);
}

#[test]
fn config_file_is_read_from_root() {
    let tmp = reactor();
    write(
        tmp.path(),
        "realign.toml",
        r#"
strict = true
fail-on-strict-violation = true
"#,
    );
    write(
        tmp.path(),
        "boms/bad.xml",
        r#"<project>
    <groupId>org.prod</groupId><artifactId>bad</artifactId><version>1</version>
    <dependencyManagement><dependencies>
        <dependency><groupId>com.x</groupId><artifactId>y</artifactId><version>3.0.redhat-1</version></dependency>
    </dependencies></dependencyManagement>
</project>"#,
    );
    let opts = AlignOptions {
        boms: vec![tmp.path().join("boms/bad.xml")],
        ..Default::default()
    };
    let err = run_alignment(tmp.path(), &opts).unwrap_err();
    assert!(err.to_string().contains("strict version-alignment rule"), "got: {err}");
}

#[test]
fn missing_bom_is_an_error() {
    let tmp = reactor();
    let opts = AlignOptions {
        boms: vec![tmp.path().join("boms/nope.xml")],
        ..Default::default()
    };
    assert!(run_alignment(tmp.path(), &opts).is_err());
}
