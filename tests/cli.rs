//! Integration tests for the `chunk_dump` binary.
//!
//! Each test writes a small chunk file into a temporary directory and checks the
//! printed tree, the summary line and the exit status.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tagchunk::{ChunkId, ChunkWriter, Dialect};
use tempfile::TempDir;

// ──────────────────────── helpers ────────────────────────

fn id(s: &[u8; 4]) -> ChunkId {
    ChunkId::new(*s)
}

/// FORM ILBM { BMHD [1, 2, 3] }: 24 bytes.
fn small_ilbm() -> Vec<u8> {
    let mut w = ChunkWriter::new(Vec::new(), &Dialect::iff());
    w.begin_group(ChunkId::FORM, id(b"ILBM")).expect("begin");
    w.chunk(id(b"BMHD"), &[1, 2, 3]).expect("chunk");
    w.finish().expect("finish")
}

/// LIST ILBM { PROP ILBM { BMHD }, FORM ILBM { BODY } }.
fn scoped_ilbm() -> Vec<u8> {
    let mut w = ChunkWriter::new(Vec::new(), &Dialect::iff());
    w.begin_group(ChunkId::LIST, id(b"ILBM")).expect("list");
    w.begin_group(ChunkId::PROP, id(b"ILBM")).expect("prop");
    w.chunk(id(b"BMHD"), &[0x42]).expect("bmhd");
    w.end_group().expect("end prop");
    w.begin_group(ChunkId::FORM, id(b"ILBM")).expect("form");
    w.chunk(id(b"BODY"), &[1, 2]).expect("body");
    w.finish().expect("finish")
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write test file");
    path
}

/// Get a `Command` for the `chunk_dump` binary.
#[allow(deprecated)]
fn dump_cmd() -> Command {
    Command::cargo_bin("chunk_dump").expect("Failed to find `chunk_dump` binary")
}

// ──────────────────────── tests ─────────────────────────

#[test]
fn test_dump_sniffs_iff() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "small.iff", &small_ilbm());

    dump_cmd()
        .arg(&file)
        .args(["--preview", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FORM ILBM (size 16 @ 8)"))
        .stdout(predicate::str::contains("  BMHD (3 bytes @ 20)  01 02 03"))
        .stdout(predicate::str::contains("-- 1 groups, 1 chunks, 0 diagnostics, 24 bytes"));
}

#[test]
fn test_dump_sniffs_riff() {
    let tmp = TempDir::new().expect("tempdir");
    let mut w = ChunkWriter::new(Vec::new(), &Dialect::riff());
    w.begin_group(ChunkId::RIFF, id(b"WAVE")).expect("begin");
    w.chunk(id(b"fmt "), &[1, 0]).expect("fmt");
    w.chunk(id(b"data"), &[0; 4]).expect("data");
    let file = write_file(tmp.path(), "tone.wav", &w.finish().expect("finish"));

    dump_cmd()
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("RIFF WAVE (size 26 @ 8)"))
        .stdout(predicate::str::contains("  fmt  (2 bytes @ 20)"))
        .stdout(predicate::str::contains("  data (4 bytes @ 38)"));
}

#[test]
fn test_declarations_file_selects_roles() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "scoped.iff", &scoped_ilbm());
    let decls = tmp.path().join("ilbm.decl");
    std::fs::write(&decls, "dialect iff;\nproperty ILBM.BMHD;\ndata ILBM.BODY;\n").expect("write declarations");

    dump_cmd()
        .arg(&file)
        .arg("--declarations")
        .arg(&decls)
        .assert()
        .success()
        .stdout(predicate::str::contains("inherits PROP ILBM"))
        .stdout(predicate::str::contains("prop BMHD (1 bytes"))
        .stdout(predicate::str::contains("BODY (2 bytes"));
}

#[test]
fn test_bad_declarations_file_fails() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "small.iff", &small_ilbm());
    let decls = tmp.path().join("broken.decl");
    std::fs::write(&decls, "property ILBM.BMHD").expect("write declarations");

    dump_cmd()
        .arg(&file)
        .arg("--declarations")
        .arg(&decls)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_unknown_magic_fails() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "junk.bin", b"JUNK\0\0\0\0");

    dump_cmd()
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unrecognized magic JUNK"));
}

#[test]
fn test_explicit_dialect_overrides_sniffing() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "small.iff", &small_ilbm());

    dump_cmd()
        .arg(&file)
        .args(["--dialect", "riff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid file magic FORM"));
}

#[test]
fn test_resilient_flag_turns_errors_into_notes() {
    let tmp = TempDir::new().expect("tempdir");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"FORM");
    bytes.extend_from_slice(&24u32.to_be_bytes());
    bytes.extend_from_slice(b"TEST");
    bytes.extend_from_slice(b"LIS1");
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(b"GOOD");
    bytes.extend_from_slice(&1u32.to_be_bytes());
    bytes.extend_from_slice(&[7, 0]);
    let file = write_file(tmp.path(), "bad.iff", &bytes);

    dump_cmd()
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));

    dump_cmd()
        .arg(&file)
        .arg("--resilient")
        .assert()
        .success()
        .stdout(predicate::str::contains("GOOD (1 bytes @ 30)"))
        .stdout(predicate::str::contains("! skipped chunk: illegal chunk id LIS1 at offset 12"))
        .stdout(predicate::str::contains("1 diagnostics"));
}

#[test]
fn test_no_data_hides_preview() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "small.iff", &small_ilbm());

    dump_cmd()
        .arg(&file)
        .args(["--preview", "4", "--no-data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BMHD (3 bytes @ 20)\n"))
        .stdout(predicate::str::contains("01 02 03").not());
}

#[test]
fn test_max_payload_flags_large_chunks() {
    let tmp = TempDir::new().expect("tempdir");
    let file = write_file(tmp.path(), "small.iff", &small_ilbm());

    dump_cmd()
        .arg(&file)
        .args(["--max-payload", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("! payload of 3 bytes exceeds the 2 byte limit"));
}

#[test]
fn test_missing_file_fails() {
    let tmp = TempDir::new().expect("tempdir");

    dump_cmd()
        .arg(tmp.path().join("absent.iff"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
