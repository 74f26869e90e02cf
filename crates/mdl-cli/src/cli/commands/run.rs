//! `mdl run` – download every URL of a manifest.

use anyhow::Result;
use mdl_core::config;
use mdl_core::fetch::{CurlFetcher, FetchOptions};
use mdl_core::scheduler::ProgressReport;
use mdl_core::session::{self, RunSummary, SessionOptions};
use std::path::Path;

/// Reports are dropped by the scheduler when this many are waiting.
const PROGRESS_BUFFER: usize = 256;

pub async fn run_batch(
    manifest: &Path,
    output_dir: &Path,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    let limit = jobs.unwrap_or_else(|| cfg.concurrency_limit()).max(1);
    let fetcher = CurlFetcher::new(FetchOptions::from_config(&cfg));

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressReport>(PROGRESS_BUFFER);
    let progress_handle = tokio::spawn(async move {
        while let Some(report) = progress_rx.recv().await {
            if !quiet {
                println!("{}", report.message);
            }
        }
    });

    let opts = SessionOptions {
        concurrency_limit: limit,
        progress: Some(progress_tx),
    };
    // The session owns the only sender; the printer ends once it returns.
    let result = session::start(manifest, output_dir, fetcher, opts).await;
    let _ = progress_handle.await;

    let summary = result?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.total == 0 {
        println!("No files to download.");
    } else {
        println!(
            "{} task(s): {} downloaded, {} skipped, {} failed",
            summary.total, summary.downloaded, summary.skipped, summary.failed
        );
    }
    if summary.has_failures() {
        println!("Failed:");
        for failure in &summary.failures {
            println!("  {}", failure);
        }
    }
    if let Some(path) = &summary.log_path {
        println!("Log: {}", path.display());
    }
    tracing::info!(
        total = summary.total,
        failed = summary.failed,
        "run completed"
    );
}
