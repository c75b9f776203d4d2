//! Command-line tests for pl0c
//!
//! These run the built `pl0c` binary against source files in a scratch
//! directory and check its exit status, console output and output file.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Output};

use pl0c::{Program, compile};
use tempfile::TempDir;

const SOURCE: &str = "var x; begin read x; write x end.";

fn pl0c(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pl0c"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run pl0c")
}

fn write_source(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("input.pl0");
    std::fs::write(&path, text).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = pl0c(&[]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("not enough arguments"));
}

#[test]
fn test_missing_output_prints_usage() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, SOURCE);

    let output = pl0c(&[input.as_os_str()]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("Usage:"));
}

#[test]
fn test_compiles_to_text() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, SOURCE);
    let out = dir.path().join("out.txt");

    let output = pl0c(&[input.as_os_str(), out.as_os_str()]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No errors, program is syntactically correct."));
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        compile(SOURCE).unwrap().to_text()
    );
}

#[test]
fn test_compiles_to_binary() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, SOURCE);
    let out = dir.path().join("out.bin");

    let output = pl0c(&[
        OsStr::new("--format"),
        OsStr::new("binary"),
        input.as_os_str(),
        out.as_os_str(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(Program::from_bytes(&bytes).unwrap(), compile(SOURCE).unwrap());
}

#[test]
fn test_compile_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "var x; begin x := 1; write z end.");
    let out = dir.path().join("out.txt");

    let output = pl0c(&[input.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("identifier not declared: z"));
    assert!(!stdout(&output).contains("No errors"));
    assert!(!out.exists());
}

#[test]
fn test_deep_nesting_is_a_compile_error() {
    let dir = TempDir::new().unwrap();
    let depth = 20_000;
    let source = format!("var x; x := {}1{}.", "(".repeat(depth), ")".repeat(depth));
    let input = write_source(&dir, &source);
    let out = dir.path().join("out.txt");

    let output = pl0c(&[input.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nesting too deep"));
    assert!(!out.exists());
}

#[test]
fn test_unreadable_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("missing.pl0");
    let out = dir.path().join("out.txt");

    let output = pl0c(&[input.as_os_str(), out.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot read"));
    assert!(!out.exists());
}

#[test]
fn test_lexeme_list_only() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "x := 42.");

    let output = pl0c(&[OsStr::new("--lexemes"), input.as_os_str()]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "Lexeme List:\n2 x 20 3 42 19\n");
}

#[test]
fn test_lexer_error_in_token_dump() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "x := 1 # .");

    let output = pl0c(&[OsStr::new("--tokens"), input.as_os_str()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Lexer error"));
}
