//! `mdl completions` and `mdl manpage` – generated shell and roff docs on stdout.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;

pub fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "mdl", &mut std::io::stdout());
}

pub fn run_manpage() -> Result<()> {
    let man = clap_mangen::Man::new(Cli::command());
    man.render(&mut std::io::stdout())
        .context("failed to write man page")
}
