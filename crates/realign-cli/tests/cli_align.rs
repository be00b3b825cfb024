use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn realign_cmd() -> Command {
    Command::cargo_bin("realign").unwrap()
}

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
        "bom.xml",
        r#"<project>
    <groupId>org.prod</groupId><artifactId>bom</artifactId><version>1</version>
    <dependencyManagement><dependencies>
        <dependency><groupId>org.foo</groupId><artifactId>baz</artifactId><version>1.1.redhat-1</version></dependency>
        <dependency><groupId>com.x</groupId><artifactId>y</artifactId><version>1.0.redhat-2</version></dependency>
    </dependencies></dependencyManagement>
</project>"#,
    );
    tmp
}

#[test]
fn test_align_prints_report() {
    let tmp = reactor();
    realign_cmd()
        .args(["align"])
        .arg(tmp.path())
        .arg("--bom")
        .arg(tmp.path().join("bom.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("property baz.version 1.0 -> 1.1.redhat-1"))
        .stdout(predicate::str::contains("com.x:y:jar 1.0 -> 1.0.redhat-2"))
        .stderr(predicate::str::contains("Aligned"));
}

#[test]
fn test_align_json_output() {
    let tmp = reactor();
    realign_cmd()
        .args(["align", "--json"])
        .arg(tmp.path())
        .arg("--bom")
        .arg(tmp.path().join("bom.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\""))
        .stdout(predicate::str::contains("\"1.1.redhat-1\""));
}

#[test]
fn test_align_service_source_with_precedence() {
    let tmp = reactor();
    write(
        tmp.path(),
        "service.json",
        r#"{"com.x:y:1.0": "1.0.redhat-7"}"#,
    );
    realign_cmd()
        .arg("align")
        .arg(tmp.path())
        .arg("--bom")
        .arg(tmp.path().join("bom.xml"))
        .arg("--service")
        .arg(tmp.path().join("service.json"))
        .arg("-DdependencySource=BOM_THEN_SERVICE")
        .assert()
        .success()
        .stdout(predicate::str::contains("com.x:y:jar 1.0 -> 1.0.redhat-7"));
}

#[test]
fn test_align_strict_violation_fails() {
    let tmp = reactor();
    realign_cmd()
        .arg("align")
        .arg(tmp.path())
        .arg("--bom")
        .arg(tmp.path().join("bom.xml"))
        .args(["-DstrictAlignment=true", "-DstrictViolationFails=true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("strict version-alignment rule"));
}

#[test]
fn test_align_without_pom_fails() {
    let tmp = TempDir::new().unwrap();
    realign_cmd()
        .arg("align")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No pom.xml found"));
}

#[test]
fn test_rules_shows_module_scoping() {
    let tmp = reactor();
    realign_cmd()
        .arg("rules")
        .arg(tmp.path())
        .args(["-DdependencyOverride.com.x:y@*=", "-DdependencyOverride.com.x:y@org.foo:bar=2.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("force    com.x:y = 2.0"))
        .stdout(predicate::str::contains("suppress com.x:y"));
}

#[test]
fn test_rules_rejects_malformed_key() {
    let tmp = reactor();
    realign_cmd()
        .arg("rules")
        .arg(tmp.path())
        .arg("-DdependencyOverride.com.x:y@a:b@c:d=1.0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_align_warns_about_non_aligned_dependencies() {
    let tmp = reactor();
    write(
        tmp.path(),
        "partial.xml",
        r#"<project>
    <groupId>org.prod</groupId><artifactId>partial</artifactId><version>1</version>
    <dependencyManagement><dependencies>
        <dependency><groupId>org.foo</groupId><artifactId>baz</artifactId><version>1.1.redhat-1</version></dependency>
    </dependencies></dependencyManagement>
</project>"#,
    );
    realign_cmd()
        .args(["align", "-DreportNonAligned=true"])
        .arg(tmp.path())
        .arg("--bom")
        .arg(tmp.path().join("partial.xml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("com.x:y:jar (not aligned)"))
        .stderr(predicate::str::contains("Unaligned"));
}
