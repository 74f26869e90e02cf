//! CLI for the MDL manifest downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_batch, run_check_path, run_completions, run_manpage, run_resolve};

/// Top-level CLI for the MDL manifest downloader.
#[derive(Debug, Parser)]
#[command(name = "mdl")]
#[command(about = "MDL: mirror every URL of a manifest into a local directory tree", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every URL listed in a manifest.
    Run {
        /// Text file with one URL per line (absolute path).
        manifest: PathBuf,
        /// Existing directory the mirror tree and logFiles/ are created in (absolute path).
        output_dir: PathBuf,
        /// Maximum fetches in flight (default: max_concurrent_downloads from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
        /// Do not print per-task progress lines.
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show where each manifest URL would be saved, without downloading.
    Resolve {
        manifest: PathBuf,
        output_dir: PathBuf,
        /// Print the task list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a path is accepted as a manifest path or output directory.
    CheckPath { path: PathBuf },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Manpage,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                manifest,
                output_dir,
                jobs,
                quiet,
            } => run_batch(&manifest, &output_dir, jobs, quiet).await?,
            CliCommand::Resolve {
                manifest,
                output_dir,
                json,
            } => run_resolve(&manifest, &output_dir, json)?,
            CliCommand::CheckPath { path } => run_check_path(&path)?,
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Manpage => run_manpage()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
