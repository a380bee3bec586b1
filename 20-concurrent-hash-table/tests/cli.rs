//! End-to-end tests that run the compiled binary against files on disk.

use std::fs;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use concurrent_hash_table::digest::digest;
use tempfile::TempDir;

fn run_binary(dir: &Path, commands: &str) -> Result<assert_cmd::assert::Assert> {
    fs::write(dir.join("commands.txt"), commands)?;
    let binary = assert_cmd::cargo::cargo_bin!("concurrent-hash-table");
    let assert = Command::new(binary)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .assert();
    Ok(assert)
}

#[test]
fn writes_results_and_event_log() -> Result<()> {
    let dir = TempDir::new()?;
    run_binary(
        dir.path(),
        "threads,3,1\ndelete,alice,0\ninsert,alice,50000,1\nsearch,alice,0\n",
    )?
    .success();

    let h = digest("alice");
    let output = fs::read_to_string(dir.path().join("output.txt"))?;
    assert_eq!(
        output,
        format!(
            "Inserted {h},alice,50000\nFound: {h},alice,50000\nDeleted record for {h},alice,50000\n"
        )
    );

    let log = fs::read_to_string(dir.path().join("hash.log"))?;
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(
        &lines[lines.len() - 3..],
        [
            "Number of lock acquisitions: 4",
            "Number of lock releases: 4",
            "Final Table:"
        ]
    );
    assert!(lines
        .iter()
        .any(|line| line.ends_with(&format!(": THREAD 1 INSERT,{h},alice,50000"))));
    Ok(())
}

#[test]
fn custom_paths_are_honoured() -> Result<()> {
    let dir = TempDir::new()?;
    let commands = dir.path().join("jobs.csv");
    let output = dir.path().join("results.txt");
    let log = dir.path().join("events.log");
    fs::write(&commands, "threads,1\nprint\n")?;

    let binary = assert_cmd::cargo::cargo_bin!("concurrent-hash-table");
    Command::new(binary)
        .arg("--commands")
        .arg(&commands)
        .arg("--output")
        .arg(&output)
        .arg("--log")
        .arg(&log)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output)?, "Current Database:\n");
    assert!(fs::read_to_string(&log)?.contains("THREAD 0 PRINT"));
    Ok(())
}

#[test]
fn malformed_config_fails_without_running() -> Result<()> {
    let dir = TempDir::new()?;
    run_binary(dir.path(), "threads,0\nprint\n")?.failure();
    assert!(!dir.path().join("output.txt").exists());
    Ok(())
}

#[test]
fn oversized_worker_count_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let assert = run_binary(dir.path(), "threads,99999999999999,0\nprint\n")?.failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("worker count too large"), "stderr: {stderr}");
    assert!(!dir.path().join("output.txt").exists());
    Ok(())
}

#[test]
fn missing_command_file_fails() -> Result<()> {
    let dir = TempDir::new()?;
    let binary = assert_cmd::cargo::cargo_bin!("concurrent-hash-table");
    Command::new(binary)
        .current_dir(dir.path())
        .assert()
        .failure();
    Ok(())
}
