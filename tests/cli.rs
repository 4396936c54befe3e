// Runs the `map2-reconcile` binary and checks its output and exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn map2_reconcile() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_map2-reconcile"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

fn fixture_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/reconcile.toml")
}

#[test]
fn reference_snapshot_exits_successfully() {
    let output = map2_reconcile()
        .args(["-c", fixture_config().to_str().unwrap(), "--strict"])
        .output()
        .expect("run map2-reconcile");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Map2 total: 3,810,692,646.12\n"));
    assert!(stdout.contains("Map2b total: 3,810,692,646.12\n"));
}

#[test]
fn missing_config_exits_with_status_1() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("reconcile.toml");

    let output = map2_reconcile()
        .args(["-c", missing.to_str().unwrap()])
        .output()
        .expect("run map2-reconcile");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load configuration"), "stderr: {}", stderr);
}

#[test]
fn missing_table_exits_with_status_1() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("reconcile.toml");
    fs::write(dir.path().join("hq.csv"), "Location_ID,Dollars_Per_Location\n1,1.00\n").unwrap();
    fs::write(
        &config,
        r#"
[[variant]]
name = "Map2"
column = "Dollars_Per_Location"
hq = "hq.csv"
satellites = "satellites.csv"
"#,
    )
    .unwrap();

    let output = map2_reconcile()
        .args(["-c", config.to_str().unwrap()])
        .output()
        .expect("run map2-reconcile");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reconciliation aborted"), "stderr: {}", stderr);
    assert!(stderr.contains("satellites.csv"), "stderr: {}", stderr);
}

#[test]
fn strict_mismatch_exits_with_status_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("reconcile.toml");
    fs::write(dir.path().join("hq.csv"), "Location_ID,Dollars_Per_Location\n1,100.00\n").unwrap();
    fs::write(
        dir.path().join("satellites.csv"),
        "Location_ID,Dollars_Per_Location\n2,50.50\n",
    )
    .unwrap();
    fs::write(
        &config,
        r#"
expected = 200.00

[[variant]]
name = "Map2"
column = "Dollars_Per_Location"
hq = "hq.csv"
satellites = "satellites.csv"
"#,
    )
    .unwrap();

    let lenient = map2_reconcile()
        .args(["-c", config.to_str().unwrap()])
        .output()
        .expect("run map2-reconcile");
    assert_eq!(lenient.status.code(), Some(0));

    let strict = map2_reconcile()
        .args(["-c", config.to_str().unwrap(), "--strict"])
        .output()
        .expect("run map2-reconcile --strict");
    assert_eq!(strict.status.code(), Some(2));

    // The report is still printed before the mismatch exit.
    let stdout = String::from_utf8_lossy(&strict.stdout);
    assert!(stdout.contains("Map2 total: 150.50\n"));
    assert!(stdout.contains("Map2 check: MISMATCH, outside tolerance of 0.01"));
}
