//! Integration tests for the bundled plugin binaries.
//!
//! These drive the real executables the way the scheduler does: a verb, an
//! `--endpoint` JSON document and payload data on stdin/stdout. The exit code
//! is the contract, so every test asserts it explicitly.

use std::fs;
use std::path::Path;

use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn local_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("local"))
}

fn fs_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("fs"))
}

fn mysql_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("mysql"))
}

fn endpoint(value: Value) -> String {
    value.to_string()
}

fn local_endpoint(dir: &Path) -> String {
    endpoint(json!({ "base_dir": dir }))
}

// =============================================================================
// Command line surface
// =============================================================================

#[test]
fn info_prints_metadata_json() {
    let output = local_cmd().arg("info").assert().code(0).get_output().clone();
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(info["name"], "Local Storage Plugin");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["features"], json!({"target": "no", "store": "yes"}));

    let output = mysql_cmd().arg("info").assert().code(0).get_output().clone();
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["features"], json!({"target": "yes", "store": "no"}));
}

#[test]
fn version_flag() {
    fs_cmd()
        .arg("--version")
        .assert()
        .code(0)
        .stdout(format!(
            "Filesystem Backup Plugin v{} - SHIELD Core Team\n",
            env!("CARGO_PKG_VERSION")
        ));
}

#[test]
fn help_shows_example_endpoint() {
    mysql_cmd()
        .arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("mysql_password"))
        .stdout(predicate::str::contains("Defaults:"));
}

#[test]
fn usage_errors_exit_1() {
    local_cmd()
        .arg("explode")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage:"));

    local_cmd().args(["store", "--bogus"]).assert().code(1);
    local_cmd().args(["store", "-e", "{}", "extra"]).assert().code(1);
    local_cmd().assert().code(1);
}

#[test]
fn missing_endpoint_is_a_usage_error() {
    for verb in ["validate", "backup", "restore", "store", "retrieve", "purge"] {
        local_cmd()
            .args([verb, "--key", "abc"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--endpoint"));
    }
}

#[test]
fn malformed_endpoint_exits_10() {
    local_cmd().args(["validate", "-e", "{base_dir"]).assert().code(10);
}

#[test]
fn endpoint_key_errors() {
    local_cmd().args(["validate", "-e", "{}"]).assert().code(12);
    local_cmd()
        .args(["validate", "-e", r#"{"base_dir": 42}"#])
        .assert()
        .code(13)
        .stderr(predicate::str::contains("base_dir"));
}

#[test]
fn invalid_endpoint_reports_a_single_line() {
    mysql_cmd()
        .env_remove("RUST_LOG")
        .args(["validate", "-e", r#"{"mysql_port": 3306}"#])
        .assert()
        .code(12)
        .stderr("Missing required endpoint key 'mysql_user'\n");

    mysql_cmd()
        .env_remove("RUST_LOG")
        .args(["validate", "-D", "-e", r#"{"mysql_port": 3306}"#])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("mysql_password"));
}

#[test]
fn retrieve_without_key_exits_11() {
    let dir = TempDir::new().unwrap();
    for verb in ["retrieve", "purge"] {
        local_cmd()
            .args([verb, "--endpoint", &local_endpoint(dir.path())])
            .assert()
            .code(11)
            .stdout(predicate::str::is_empty());
    }
}

#[test]
fn unsupported_verbs_exit_2() {
    let dir = TempDir::new().unwrap();
    local_cmd()
        .args(["backup", "-e", &local_endpoint(dir.path())])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'backup' action is not supported"));

    fs_cmd()
        .args(["retrieve", "-e", &local_endpoint(dir.path()), "-k", "x"])
        .assert()
        .code(2);
}

// =============================================================================
// Local store
// =============================================================================

#[test]
fn local_store_retrieve_purge() {
    let dir = TempDir::new().unwrap();
    let ep = local_endpoint(dir.path());
    let payload: Vec<u8> = (0..=255u8).cycle().take(300_000).collect();

    let output = local_cmd()
        .args(["store", "--endpoint", &ep])
        .write_stdin(payload.clone())
        .assert()
        .code(0)
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("{\"key\": \""), "{stdout}");
    assert!(stdout.ends_with("}\n"), "{stdout}");
    let key = serde_json::from_str::<Value>(&stdout).unwrap()["key"]
        .as_str()
        .unwrap()
        .to_string();

    local_cmd()
        .args(["-e", &ep, "retrieve", "-k", &key])
        .assert()
        .code(0)
        .stdout(payload);

    local_cmd()
        .args(["purge", "-e", &ep, "-k", &key])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
    assert!(!dir.path().join(&key).exists());

    local_cmd()
        .env_remove("RUST_LOG")
        .args(["retrieve", "-e", &ep, "-k", &key])
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(format!("'{key}'")));

    local_cmd()
        .env_remove("RUST_LOG")
        .args(["purge", "-e", &ep, "-k", &key])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(format!("'{key}'")));
}

#[test]
fn local_rejects_foreign_keys() {
    let dir = TempDir::new().unwrap();
    local_cmd()
        .args(["purge", "-e", &local_endpoint(dir.path()), "-k", "../outside"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid storage key"));
}

// =============================================================================
// Targets
// =============================================================================

#[cfg(unix)]
#[test]
fn fs_backup_and_restore() {
    let source = TempDir::new().unwrap();
    fs::create_dir(source.path().join("sub")).unwrap();
    fs::write(source.path().join("sub/data.txt"), "important").unwrap();
    fs::write(source.path().join("skip.tmp"), "scratch").unwrap();

    let output = fs_cmd()
        .args([
            "backup",
            "-e",
            &endpoint(json!({"base_dir": source.path(), "exclude": "*.tmp"})),
        ])
        .assert()
        .code(0)
        .get_output()
        .clone();
    assert!(!output.stdout.is_empty());

    let target = TempDir::new().unwrap();
    let restore_dir = target.path().join("restored");
    fs_cmd()
        .args(["restore", "-e", &endpoint(json!({"base_dir": restore_dir}))])
        .write_stdin(output.stdout)
        .assert()
        .code(0);

    assert_eq!(
        fs::read_to_string(restore_dir.join("sub/data.txt")).unwrap(),
        "important"
    );
    assert!(!restore_dir.join("skip.tmp").exists());
}

#[cfg(unix)]
#[test]
fn fs_backup_of_missing_dir_is_exec_failure() {
    let dir = TempDir::new().unwrap();
    fs_cmd()
        .args([
            "backup",
            "-e",
            &endpoint(json!({"base_dir": dir.path().join("missing")})),
        ])
        .assert()
        .code(3);
}

/// Writes an executable script standing in for a mysql client binary.
#[cfg(unix)]
fn fake_binary(dir: &Path, name: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn mysql_backup_streams_dump_to_stdout() {
    let bindir = TempDir::new().unwrap();
    fake_binary(bindir.path(), "mysqldump", r#"for arg in "$@"; do echo "$arg"; done"#);

    mysql_cmd()
        .args([
            "backup",
            "-e",
            &endpoint(json!({
                "mysql_user": "root",
                "mysql_password": "s3cret pass",
                "mysql_database": "shop",
                "mysql_bindir": bindir.path(),
            })),
        ])
        .assert()
        .code(0)
        .stdout("-h\n127.0.0.1\n-P\n3306\n-u\nroot\n--password=s3cret pass\nshop\n");
}

#[cfg(unix)]
#[test]
fn mysql_restore_reads_stdin() {
    let bindir = TempDir::new().unwrap();
    let replayed = bindir.path().join("replayed.sql");
    fake_binary(
        bindir.path(),
        "mysql",
        &format!("cat > '{}'", replayed.display()),
    );

    mysql_cmd()
        .args([
            "restore",
            "-e",
            &endpoint(json!({
                "mysql_user": "root",
                "mysql_password": "pw",
                "mysql_bindir": bindir.path(),
            })),
        ])
        .write_stdin("CREATE TABLE t (id INT);\n")
        .assert()
        .code(0);

    assert_eq!(
        fs::read_to_string(replayed).unwrap(),
        "CREATE TABLE t (id INT);\n"
    );
}

#[cfg(unix)]
#[test]
fn mysql_failing_dump_exits_3() {
    let bindir = TempDir::new().unwrap();
    fake_binary(bindir.path(), "mysqldump", "echo 'access denied' >&2; exit 2");

    mysql_cmd()
        .args([
            "backup",
            "-e",
            &endpoint(json!({
                "mysql_user": "root",
                "mysql_password": "pw",
                "mysql_bindir": bindir.path(),
            })),
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("mysqldump"));
}
