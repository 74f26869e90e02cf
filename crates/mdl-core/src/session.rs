//! One batch run from a manifest path and an output root: setup checks, run
//! log, manifest, task resolution, then the scheduler drive loop.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::error::SetupError;
use crate::fetch::Fetcher;
use crate::manifest::load_manifest;
use crate::run_log::RunLogger;
use crate::scheduler::{DownloadScheduler, ProgressReport};
use crate::url_model::{resolve_task, DownloadTask};

/// Characters rejected anywhere in an input path.
const FORBIDDEN_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// True when `path` is usable as a manifest path or output directory: non-empty,
/// absolute and free of `< > : " | ? *`. Existence is checked separately.
pub fn validate_input_path(path: &Path) -> bool {
    let s = path.to_string_lossy();
    !s.is_empty() && !s.contains(FORBIDDEN_PATH_CHARS) && path.is_absolute()
}

/// Outcome counts and failure list of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<String>,
    /// The run log; `None` only if the run never opened one.
    pub log_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub concurrency_limit: usize,
    /// Receives a report on every state change; see [`DownloadScheduler::set_progress_sender`].
    pub progress: Option<mpsc::Sender<ProgressReport>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: crate::config::DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            progress: None,
        }
    }
}

fn check_inputs(manifest: &Path, output_root: &Path) -> Result<(), SetupError> {
    if !validate_input_path(manifest) {
        return Err(SetupError::InvalidPath {
            what: "manifest",
            path: manifest.to_path_buf(),
        });
    }
    if !validate_input_path(output_root) {
        return Err(SetupError::InvalidPath {
            what: "output directory",
            path: output_root.to_path_buf(),
        });
    }
    if !manifest.exists() {
        return Err(SetupError::ManifestMissing(manifest.to_path_buf()));
    }
    if !output_root.is_dir() {
        return Err(SetupError::OutputDirMissing(output_root.to_path_buf()));
    }
    Ok(())
}

/// Validates the inputs and resolves every manifest entry without touching
/// the network or writing anything.
pub fn plan(manifest: &Path, output_root: &Path) -> Result<Vec<DownloadTask>, SetupError> {
    check_inputs(manifest, output_root)?;
    let lines = load_manifest(manifest).map_err(|source| SetupError::ManifestUnreadable {
        path: manifest.to_path_buf(),
        source,
    })?;
    Ok(lines.iter().map(|l| resolve_task(l, output_root)).collect())
}

/// Runs the whole batch and returns once every task has an outcome.
///
/// Only setup problems are errors; every per-task problem ends up in
/// [`RunSummary::failures`] and in the run log.
pub async fn start<F: Fetcher>(
    manifest: &Path,
    output_root: &Path,
    fetcher: F,
    opts: SessionOptions,
) -> Result<RunSummary, SetupError> {
    check_inputs(manifest, output_root)?;

    let mut logger = RunLogger::open_run(output_root)?;
    let lines = match load_manifest(manifest) {
        Ok(lines) => lines,
        Err(source) => {
            tracing::error!(path = %manifest.display(), "cannot read manifest: {}", source);
            logger.close_aborted(&format!(
                "无法打开URL列表文件: {} ({})",
                manifest.display(),
                source
            ));
            return Err(SetupError::ManifestUnreadable {
                path: manifest.to_path_buf(),
                source,
            });
        }
    };
    logger.record(&format!("[信息] URL列表文件已打开: {}", manifest.display()));

    if lines.is_empty() {
        tracing::info!(path = %manifest.display(), "manifest has no entries");
        logger.close_empty();
        return Ok(RunSummary {
            log_path: Some(logger.path().to_path_buf()),
            ..RunSummary::default()
        });
    }

    let tasks: Vec<DownloadTask> = lines.iter().map(|l| resolve_task(l, output_root)).collect();

    let (mut scheduler, mut completions) = DownloadScheduler::new(fetcher, opts.concurrency_limit);
    if let Some(tx) = opts.progress {
        scheduler.set_progress_sender(tx);
    }
    scheduler.start(logger, tasks);

    while scheduler.is_running() {
        match completions.recv().await {
            Some(completion) => scheduler.on_fetch_complete(completion),
            // The scheduler holds a sender, so this only happens if it was dropped.
            None => break,
        }
    }

    let state = scheduler.state();
    let tally = state.tally();
    Ok(RunSummary {
        total: state.total(),
        downloaded: tally.downloaded,
        skipped: tally.skipped,
        failed: tally.failed,
        failures: state.failures().to_vec(),
        log_path: scheduler.log_path().map(Path::to_path_buf),
    })
}
