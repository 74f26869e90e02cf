//! Tests for resolve, check-path and completions.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::path::Path;

#[test]
fn cli_parse_resolve() {
    match parse(&["mdl", "resolve", "/u.txt", "/out"]) {
        CliCommand::Resolve {
            manifest,
            output_dir,
            json,
        } => {
            assert_eq!(manifest, Path::new("/u.txt"));
            assert_eq!(output_dir, Path::new("/out"));
            assert!(!json);
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_json() {
    match parse(&["mdl", "resolve", "/u.txt", "/out", "--json"]) {
        CliCommand::Resolve { json, .. } => assert!(json),
        _ => panic!("expected Resolve --json"),
    }
}

#[test]
fn cli_parse_check_path() {
    match parse(&["mdl", "check-path", "/tmp/x"]) {
        CliCommand::CheckPath { path } => assert_eq!(path, Path::new("/tmp/x")),
        _ => panic!("expected CheckPath"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["mdl", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(Cli::try_parse_from(["mdl", "completions", "tcsh"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn check_path_command() {
    let dir = tempfile::tempdir().unwrap();
    assert!(crate::cli::commands::run_check_path(dir.path()).is_ok());
    assert!(crate::cli::commands::run_check_path(Path::new("relative")).is_err());
    assert!(crate::cli::commands::run_check_path(Path::new("/tmp/a|b")).is_err());
}

#[test]
fn cli_parse_manpage() {
    assert!(matches!(parse(&["mdl", "manpage"]), CliCommand::Manpage));
}
