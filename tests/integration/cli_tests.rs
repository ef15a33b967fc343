//! Exercises the compiled `struktur` binary directly via `assert_cmd`,
//! the way the teacher's `tests/integration_*.rs` files drive `agpm`/`ccpm`
//! rather than calling library internals.

use assert_cmd::Command;
use predicates::prelude::*;
use struktur_cli::test_utils::{ClassFixture, InstanceFixture, TestEnvironment};

#[test]
fn build_command_writes_output_and_exits_zero() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    InstanceFixture::basic("home", "page").write_to(&env.instances_dir).unwrap();

    let mut cmd = Command::cargo_bin("struktur").unwrap();
    cmd.arg("build")
        .arg("--config")
        .arg(&env.config_path)
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"));

    assert!(env.build_file_exists("canonical.json"));
}

#[test]
fn build_command_exits_non_zero_on_a_classless_instance() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    std::fs::write(env.instances_dir.join("orphan.json"), r#"{ "$id": "orphan", "name": "orphan" }"#).unwrap();

    let mut cmd = Command::cargo_bin("struktur").unwrap();
    cmd.arg("build").arg("--config").arg(&env.config_path).arg("--no-progress").assert().failure();
}

#[test]
fn validate_command_reports_and_fails_on_invalid_instances() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    std::fs::write(env.instances_dir.join("broken.json"), r#"{ "$id": "broken", "$class": "page" }"#).unwrap();

    let mut cmd = Command::cargo_bin("struktur").unwrap();
    cmd.arg("validate")
        .arg("--config")
        .arg(&env.config_path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid"));
}

#[test]
fn check_constraints_command_is_clean_for_an_unrelated_lineage() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();

    let mut cmd = Command::cargo_bin("struktur").unwrap();
    cmd.arg("check-constraints")
        .arg("--config")
        .arg(&env.config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("no constraint conflicts"));
}
