//! Object storage commands against the local backend

mod common;

use common::TestWorkspace;
use predicates::prelude::*;

fn with_local_store() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    let storage = format!(
        "storage:\n  backend: local\n  root: '{}'\n",
        workspace.path.join("bucket").display()
    );
    workspace.write_config(&workspace.config_for(
        "https://example.org/assets.tar.gz",
        None,
        &storage,
    ));
    workspace
}

#[test]
fn test_put_then_get() {
    let workspace = with_local_store();
    workspace.write_file("report.csv", "start,end\n0,3\n");

    workspace
        .cmd()
        .args(["storage", "put", "results/site1/report.csv", "report.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored 14 bytes at"))
        .stdout(predicate::str::contains(common::digest_of(
            &workspace.path.join("report.csv"),
        )));

    assert_eq!(
        workspace.read_file("bucket/results/site1/report.csv"),
        "start,end\n0,3\n"
    );

    workspace
        .cmd()
        .args(["storage", "get", "results/site1/report.csv"])
        .assert()
        .success()
        .stdout(predicate::eq("start,end\n0,3\n"));
}

#[test]
fn test_get_missing_object() {
    let workspace = with_local_store();
    workspace
        .cmd()
        .args(["storage", "get", "results/absent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Object not found: results/absent.csv"));
}

#[test]
fn test_key_cannot_escape_root() {
    let workspace = with_local_store();
    workspace.write_file("report.csv", "x");
    workspace
        .cmd()
        .args(["storage", "put", "../outside.csv", "report.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid object key"));
    assert!(!workspace.file_exists("outside.csv"));
}

#[test]
fn test_storage_not_configured() {
    let workspace = TestWorkspace::new();
    workspace.write_config(&workspace.config_for("https://example.org/assets.tar.gz", None, ""));
    workspace
        .cmd()
        .args(["storage", "get", "anything"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Object storage is not configured"));
}
