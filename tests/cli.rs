use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// A directory holding three recognizable projects worth of artifacts.
fn setup_test_directory() -> tempfile::TempDir {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    fs::write(dir.path().join("node_modules/index.js"), "module.exports = 1;\n").unwrap();

    fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"test\"").unwrap();
    fs::create_dir_all(dir.path().join("target")).unwrap();
    fs::write(dir.path().join("target/debug.txt"), "debug").unwrap();

    fs::create_dir_all(dir.path().join("__pycache__")).unwrap();
    fs::write(dir.path().join("__pycache__/test.pyc"), "compiled").unwrap();

    fs::write(dir.path().join("test_file.txt"), "This is a test").unwrap();

    dir
}

#[test]
fn test_dry_run_lists_all_targets_and_deletes_nothing() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    let assert = cmd.arg(dir.path()).arg("--dry-run").arg("--yes").assert();

    assert
        .success()
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("target"))
        .stdout(predicate::str::contains("__pycache__"))
        .stdout(predicate::str::contains("Would remove:"))
        .stdout(predicate::str::contains("Total size reclaimed:"))
        .stdout(predicate::str::contains("Dry run mode: nothing was deleted."));

    assert!(dir.path().join("node_modules").exists());
    assert!(dir.path().join("target").exists());
    assert!(dir.path().join("__pycache__").exists());
}

#[test]
fn test_closed_stdin_aborts_without_deleting() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    let assert = cmd.arg(dir.path()).write_stdin("").assert();

    // End of input aborts the scan; nothing was confirmed.
    assert
        .success()
        .stdout(predicate::str::contains("Total size reclaimed: 0.000 MiB"));

    assert!(dir.path().join("node_modules").exists());
    assert!(dir.path().join("target").exists());
    assert!(dir.path().join("__pycache__").exists());
}

#[test]
fn test_declining_every_batch_preserves_directories() {
    let dir = setup_test_directory();

    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    let assert = cmd.arg(dir.path()).write_stdin("n\nn\nn\n").assert();

    assert
        .success()
        .stdout(predicate::str::contains("node_modules"))
        .stdout(predicate::str::contains("Total size reclaimed: 0.000 MiB"));

    assert!(dir.path().join("node_modules").exists());
    assert!(dir.path().join("target").exists());
    assert!(dir.path().join("__pycache__").exists());
}

#[test]
fn test_confirming_a_batch_deletes_its_directories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    fs::write(dir.path().join("node_modules/index.js"), "x").unwrap();

    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    let assert = cmd.arg(dir.path()).write_stdin("y\n").assert();

    assert
        .success()
        .stdout(predicate::str::contains("Deleting"))
        .stdout(predicate::str::contains("Total size reclaimed:"));

    assert!(!dir.path().join("node_modules").exists());
    assert!(dir.path().join("package.json").exists());
}

#[test]
fn test_unknown_root_fails_before_scanning() {
    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    let assert = cmd.arg("/definitely/not/a/real/path").assert();

    assert
        .failure()
        .stderr(predicate::str::contains("cannot resolve path"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("reclaim").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}
