//! `mdl resolve` – dry run: show each task's save path.

use anyhow::{Context, Result};
use mdl_core::session;
use std::path::Path;

pub fn run_resolve(manifest: &Path, output_dir: &Path, json: bool) -> Result<()> {
    let tasks = session::plan(manifest, output_dir)?;
    if json {
        let out = serde_json::to_string_pretty(&tasks).context("serialize task list")?;
        println!("{}", out);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No files to download.");
        return Ok(());
    }
    for task in &tasks {
        println!("{} -> {}", task.original_url, task.save_path.display());
    }
    Ok(())
}
