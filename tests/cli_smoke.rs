//! End-to-end checks of the `file_binder` binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;

fn binder() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("file_binder");
    cmd.env_remove("FILE_BINDER_STUB");
    cmd
}

fn write(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn help_lists_commands() {
    binder()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bind"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn single_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write(dir.path(), "tool.exe", b"tool");
    let output = dir.path().join("Bundle.exe");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(&output)
        .arg("-x")
        .arg(&tool)
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least 2 files must be bound"));
    assert!(!output.exists());
}

#[test]
fn files_without_executable_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"a");
    let b = write(dir.path(), "b.txt", b"b");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(dir.path().join("Bundle.exe"))
        .arg("-f")
        .arg(&a)
        .arg("-f")
        .arg(&b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least 1 file must be executable"));
}

#[test]
fn missing_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write(dir.path(), "tool.exe", b"tool");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(dir.path().join("Bundle.exe"))
        .arg("-x")
        .arg(&tool)
        .arg("-f")
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn manifest_bind_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "setup.exe", b"setup bytes");
    write(dir.path(), "readme.txt", b"read me");
    let manifest = write(
        dir.path(),
        "bind.toml",
        br#"
output = "out/Bundle.exe"

[[file]]
path = "setup.exe"
executable = true

[[file]]
path = "readme.txt"
"#,
    );

    binder()
        .arg("bind")
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let output = dir.path().join("out").join("Bundle.exe");
    assert!(output.is_file());

    binder()
        .arg("inspect")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Bundle\""))
        .stdout(predicate::str::contains("setup.exe (11 bytes) [exec]"))
        .stdout(predicate::str::contains("readme.txt (7 bytes)"));
}

#[test]
fn inspect_plain_executable_reports_no_payload() {
    let dir = tempfile::tempdir().unwrap();
    let plain = write(dir.path(), "plain.bin", b"nothing appended here");

    binder()
        .arg("inspect")
        .arg(&plain)
        .assert()
        .failure()
        .stderr(predicate::str::contains("carries no bound files"));
}

#[test]
fn bind_json_reports_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write(dir.path(), "tool.exe", b"tool");
    let notes = write(dir.path(), "notes.txt", b"notes");

    binder()
        .arg("bind")
        .arg("--json")
        .arg("-o")
        .arg(dir.path().join("Bundle.exe"))
        .arg("-f")
        .arg(&tool)
        .arg("-f")
        .arg(&notes)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("\"checksum\""));
}

/// The produced executable extracts its files into `$TMPDIR/<stem> Binds`.
#[cfg(unix)]
#[test]
fn produced_executable_extracts_payload() {
    let dir = tempfile::tempdir().unwrap();
    let temp_root = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "hello.sh", b"#!/bin/sh\nexit 0\n");
    let data = write(dir.path(), "data.txt", b"payload data");
    let output = dir.path().join("Extract.exe");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(&output)
        .arg("-x")
        .arg(&script)
        .arg("-f")
        .arg(&data)
        .assert()
        .success();

    Command::new(&output)
        .env("TMPDIR", temp_root.path())
        .assert()
        .success();

    let extracted = temp_root.path().join("Extract Binds");
    assert_eq!(
        std::fs::read(extracted.join("data.txt")).unwrap(),
        b"payload data"
    );
    assert_eq!(
        std::fs::read(extracted.join("hello.sh")).unwrap(),
        b"#!/bin/sh\nexit 0\n"
    );
}

/// The stub runs before any async runtime exists: tokio refuses to build a
/// runtime with a zero worker count, yet extraction still succeeds.
#[cfg(unix)]
#[test]
fn produced_executable_runs_without_async_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let temp_root = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "hello.sh", b"#!/bin/sh\nexit 0\n");
    let data = write(dir.path(), "data.txt", b"sync");
    let output = dir.path().join("Sync.exe");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(&output)
        .arg("-x")
        .arg(&script)
        .arg("-f")
        .arg(&data)
        .assert()
        .success();

    Command::new(&output)
        .env("TMPDIR", temp_root.path())
        .env("TOKIO_WORKER_THREADS", "0")
        .assert()
        .success();

    let extracted = temp_root.path().join("Sync Binds");
    assert_eq!(std::fs::read(extracted.join("data.txt")).unwrap(), b"sync");
}

#[test]
fn interleaved_flags_bind_in_command_line_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"a");
    let b = write(dir.path(), "b.bin", b"b");
    let c = write(dir.path(), "c.exe", b"c");
    let output = dir.path().join("Order.exe");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(&output)
        .arg("-f")
        .arg(&a)
        .arg("-x")
        .arg(&b)
        .arg("-f")
        .arg(&c)
        .assert()
        .success();

    binder()
        .arg("inspect")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)a\.txt.*b\.bin.*c\.exe").unwrap());
}

#[test]
fn dot_output_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write(dir.path(), "tool.exe", b"tool");
    let notes = write(dir.path(), "notes.txt", b"notes");
    let output = dir.path().join("..exe");

    binder()
        .arg("bind")
        .arg("-o")
        .arg(&output)
        .arg("-x")
        .arg(&tool)
        .arg("-f")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid output file name"));
    assert!(!output.exists());
}
