//! CLI surface tests for the rpnc binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn rpnc() -> Command {
    Command::cargo_bin("rpnc").expect("binary must build")
}

fn source_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write source");
    file
}

#[test]
fn test_compile_success_prints_tac() {
    let input = source_file("(3 5 +)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("t2 = 8"))
        .stderr(predicate::str::contains("1 line(s) compiled, 0 failed"));
}

#[test]
fn test_compile_failure_exits_nonzero() {
    let input = source_file("(MEM)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("MemoryError [line 1]"));
}

#[test]
fn test_compile_keeps_going_after_bad_line() {
    let input = source_file("(3 5 &)\n(1 2 +)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 line(s) compiled, 1 failed"));
}

#[test]
fn test_output_writes_assembly() {
    let input = source_file("(42 MEM)\n");
    let dir = tempfile::tempdir().expect("temp dir");
    let asm_path = dir.path().join("program.s");

    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--output")
        .arg(&asm_path)
        .assert()
        .success();

    let asm = std::fs::read_to_string(&asm_path).expect("assembly file");
    assert!(asm.contains("main:"));
    assert!(asm.contains("call programa_principal"));
    assert!(asm.contains("loop_forever:"));
}

#[test]
fn test_emit_tac_writes_listing() {
    let input = source_file("(3 5 +)\n");
    let dir = tempfile::tempdir().expect("temp dir");
    let tac_path = dir.path().join("program.tac");

    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--emit-tac")
        .arg(&tac_path)
        .assert()
        .success();

    let listing = std::fs::read_to_string(&tac_path).expect("tac file");
    assert_eq!(listing, "t2 = 8\n");
}

#[test]
fn test_nivel_folding_keeps_instructions() {
    let input = source_file("(3 5 +)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--nivel")
        .arg("folding")
        .assert()
        .success()
        .stdout(predicate::str::contains("t2 = t0 + t1"));
}

#[test]
fn test_invalid_nivel_rejected() {
    let input = source_file("(3 5 +)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--nivel")
        .arg("aggressive")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown optimization level"));
}

#[test]
fn test_invalid_baud_rejected() {
    let input = source_file("(3 5 +)\n");
    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--baud")
        .arg("300")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported baud rate"));
}

#[test]
fn test_missing_input_reports_io_error() {
    rpnc()
        .arg("compile")
        .arg("does-not-exist.rpn")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_config_file_sets_defaults() {
    let input = source_file("(3 5 +)\n");
    let mut config = NamedTempFile::new().expect("config file");
    config
        .write_all(b"nivel = \"folding\"\n")
        .expect("write config");

    rpnc()
        .arg("compile")
        .arg(input.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("t2 = t0 + t1"));
}
