//! Tests for the run subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_run() {
    match parse(&["mdl", "run", "/data/urls.txt", "/data/out"]) {
        CliCommand::Run {
            manifest,
            output_dir,
            jobs,
            quiet,
        } => {
            assert_eq!(manifest, Path::new("/data/urls.txt"));
            assert_eq!(output_dir, Path::new("/data/out"));
            assert!(jobs.is_none());
            assert!(!quiet);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_jobs_and_quiet() {
    match parse(&["mdl", "run", "/u.txt", "/out", "--jobs", "4", "-q"]) {
        CliCommand::Run { jobs, quiet, .. } => {
            assert_eq!(jobs, Some(4));
            assert!(quiet);
        }
        _ => panic!("expected Run with --jobs"),
    }
}

#[test]
fn cli_run_requires_output_dir() {
    assert!(Cli::try_parse_from(["mdl", "run", "/u.txt"]).is_err());
}

#[test]
fn cli_run_rejects_non_numeric_jobs() {
    assert!(Cli::try_parse_from(["mdl", "run", "/u.txt", "/out", "--jobs", "many"]).is_err());
}
