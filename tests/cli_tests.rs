//! End-to-end runs of the holewalk binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn holewalk() -> Command {
    Command::cargo_bin("holewalk").unwrap()
}

#[test]
fn walk_prints_seven_categories() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("one.txt"), b"1").unwrap();
    fs::write(dir.path().join("two.txt"), b"2").unwrap();
    fs::write(dir.path().join("three.txt"), b"3").unwrap();

    let output = holewalk().arg("walk").arg(dir.path()).assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "regular files =       3, 75.00%");
    assert_eq!(lines[1], "directories =       1, 25.00%");
    assert!(lines[6].starts_with("sockets = "));
}

#[test]
fn walk_json_report() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();

    let output = holewalk()
        .args(["walk", "--format", "json"])
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["counts"]["directories"], 2);
    assert_eq!(json["total"], 2);
    assert_eq!(json["status"], 0);
}

#[test]
fn walk_missing_root_still_reports() {
    let dir = TempDir::new().unwrap();

    holewalk()
        .arg("walk")
        .arg(dir.path().join("absent"))
        .assert()
        .success()
        .stdout(predicate::str::contains("regular files =       0,  0.00%"))
        .stderr(predicate::str::contains("stat error"));
}

#[test]
fn copy_reproduces_hole_file() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("file.hole");
    let dst = dir.path().join("file.copy");

    holewalk().arg("-q").arg("hole").arg(&src).assert().success();
    holewalk().arg("copy").arg(&src).arg(&dst).assert().success().stdout(predicate::str::contains("Holes:"));

    assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());
    assert_eq!(fs::metadata(&dst).unwrap().len(), 16394);
}

#[test]
fn copy_failure_names_operation_and_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.bin");

    holewalk()
        .arg("copy")
        .arg(&missing)
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("open failed"))
        .stderr(predicate::str::contains("missing.bin"));
}

#[test]
fn copy_rejects_zero_block_size() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::write(&src, b"data").unwrap();

    holewalk()
        .args(["copy", "--block-size", "0"])
        .arg(&src)
        .arg(dir.path().join("dst"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn relay_passes_stdin_through() {
    holewalk()
        .args(["relay", "--buffer-size", "3"])
        .write_stdin("relay me through a tiny buffer")
        .assert()
        .success()
        .stdout("relay me through a tiny buffer");
}

#[test]
fn sync_probe_reports_three_rounds() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("sample.txt");

    holewalk()
        .arg("sync-probe")
        .arg(&file)
        .args(["--pause-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plain"))
        .stdout(predicate::str::contains("DataSync"));

    assert_eq!(fs::read(&file).unwrap(), b"helloworld\n".repeat(3));
}

#[cfg(unix)]
#[test]
fn dup_prints_target_descriptor() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("f");
    fs::write(&file, b"x").unwrap();

    holewalk().arg("dup").arg(&file).arg("100").assert().success().stdout("100\n");
}
