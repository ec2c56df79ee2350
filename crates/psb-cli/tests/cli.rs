//! CLI surface tests. Everything here must run offline, so aggregation is
//! exercised through the static devolved-administrations driver only.

use assert_cmd::Command;
use predicates::prelude::*;

fn psb() -> Command {
    Command::cargo_bin("psb").expect("binary builds")
}

#[test]
fn help_lists_the_documented_options() {
    psb()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cache"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--source"));
}

#[test]
fn sources_subcommand_lists_the_registry() {
    psb()
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("gov_uk_api"))
        .stdout(predicate::str::contains("gias"))
        .stdout(predicate::str::contains("scottish_courts"));
}

#[test]
fn unknown_source_filter_fails_with_exit_one() {
    psb()
        .args(["--source", "definitely-not-a-source"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn cache_without_clear_is_an_error() {
    psb().arg("cache").assert().failure().code(1);
}

#[test]
fn cache_clear_succeeds_even_when_empty() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    psb()
        .current_dir(dir.path())
        .args(["cache", "--clear"])
        .assert()
        .success();
}

#[test]
fn offline_aggregation_writes_the_artifact() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    psb()
        .current_dir(dir.path())
        .args(["--source", "devolved", "--quiet"])
        .assert()
        .success();

    let artifact = dir.path().join("dist").join("orgs.json");
    let raw = std::fs::read_to_string(&artifact).expect("artifact exists");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(value["organisations"].as_array().map(Vec::len), Some(3));
    assert!(value["metadata"]["statistics"]["totalOrganisations"].is_number());
}

#[test]
fn custom_output_path_is_respected() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    psb()
        .current_dir(dir.path())
        .args([
            "compile",
            "--source",
            "devolved",
            "--quiet",
            "--output",
            "out/bodies.json",
        ])
        .assert()
        .success();
    assert!(dir.path().join("out").join("bodies.json").exists());
}
