//! Bounded-concurrency download scheduler.
//!
//! Owns the run state and drives it from exactly two places: [`DownloadScheduler::dispatch`]
//! (after enqueue and after every completion) and
//! [`DownloadScheduler::on_fetch_complete`]. Both take `&mut self`, so a run's
//! state has a single writer; fetches themselves run elsewhere and report back
//! through the completion channel returned by [`DownloadScheduler::new`].

mod complete;
mod dispatch;
mod outcome;
mod progress;
mod state;


use std::path::Path;
use tokio::sync::mpsc;

use crate::fetch::{CompletionReceiver, CompletionSender, Fetcher, RunId};
use crate::run_log::RunLogger;
use crate::url_model::DownloadTask;

pub use outcome::{SkipReason, TaskOutcome};
pub use progress::{ProgressReport, FINISHED_STATUS, IDLE_STATUS};
pub use state::{OutcomeTally, RunState};

use progress::processed_status;

pub struct DownloadScheduler<F: Fetcher> {
    fetcher: F,
    limit: usize,
    run_id: RunId,
    /// True from `start` until the terminal summary or a reset.
    live: bool,
    /// Set when the terminal summary of the current run has been emitted.
    finished: bool,
    state: RunState,
    logger: Option<RunLogger>,
    completion_tx: CompletionSender,
    progress_tx: Option<mpsc::Sender<ProgressReport>>,
    status: String,
}

impl<F: Fetcher> DownloadScheduler<F> {
    /// Creates an idle scheduler. The returned receiver yields every completion
    /// sent by `fetcher`; feed each one to [`DownloadScheduler::on_fetch_complete`].
    pub fn new(fetcher: F, concurrency_limit: usize) -> (Self, CompletionReceiver) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let scheduler = DownloadScheduler {
            fetcher,
            limit: concurrency_limit.max(1),
            run_id: 0,
            live: false,
            finished: false,
            state: RunState::default(),
            logger: None,
            completion_tx,
            progress_tx: None,
            status: IDLE_STATUS.to_string(),
        };
        (scheduler, completion_rx)
    }

    /// Sends a [`ProgressReport`] after every state transition. Reports are
    /// dropped when the channel is full.
    pub fn set_progress_sender(&mut self, tx: mpsc::Sender<ProgressReport>) {
        self.progress_tx = Some(tx);
    }

    /// Starts a run: replaces any previous state, enqueues `tasks` in order and
    /// pumps the queue. Any run still in progress is reset first.
    pub fn start(&mut self, logger: RunLogger, tasks: Vec<DownloadTask>) {
        if self.live {
            tracing::warn!(run = self.run_id, "starting a new run over an unfinished one");
        }
        self.clear();
        self.state = RunState::with_tasks(tasks);
        self.logger = Some(logger);
        self.live = true;

        let total = self.state.total;
        tracing::info!(run = self.run_id, total, limit = self.limit, "run started");
        self.record(&format!("[信息] 共识别 {} 个有效任务，开始调度下载。", total));
        self.set_status(format!("总任务数：{}，开始下载...", total));

        self.dispatch();
        self.finish_if_done();
    }

    /// Abandons the current run: clears queue, counters and failures and
    /// closes its log. Completions of fetches issued before the reset are
    /// ignored when they arrive.
    pub fn reset(&mut self) {
        self.clear();
        self.set_status(IDLE_STATUS.to_string());
    }

    fn clear(&mut self) {
        if let Some(mut logger) = self.logger.take() {
            logger.abandon();
        }
        if self.live {
            tracing::info!(
                run = self.run_id,
                completed = self.state.completed,
                total = self.state.total,
                "run reset"
            );
        }
        // Any in-flight ticket now names a run that no longer exists.
        self.run_id += 1;
        self.state = RunState::default();
        self.live = false;
        self.finished = false;
    }

    /// True while a started run still has tasks without an outcome.
    pub fn is_running(&self) -> bool {
        self.live
    }

    /// True once the current run has completed every task. Reset clears it.
    pub fn is_terminal(&self) -> bool {
        self.finished
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Failures of the current run so far, in the order they happened.
    pub fn failures(&self) -> &[String] {
        &self.state.failures
    }

    /// Latest human-readable status line.
    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn concurrency_limit(&self) -> usize {
        self.limit
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.logger.as_ref().map(|l| l.path())
    }

    fn record(&mut self, line: &str) {
        if let Some(logger) = self.logger.as_mut() {
            logger.record(line);
        }
    }

    fn record_failure(&mut self, message: String) {
        if let Some(logger) = self.logger.as_mut() {
            logger.record_failure(message.clone());
        }
        self.state.failures.push(message);
    }

    fn set_status(&mut self, status: String) {
        self.status = status;
        if let Some(tx) = self.progress_tx.as_ref() {
            let _ = tx.try_send(ProgressReport {
                completed: self.state.completed,
                total: self.state.total,
                active: self.state.active(),
                message: self.status.clone(),
            });
        }
    }

    /// Logs a task's resolution, records a failure if any and counts it as completed.
    fn settle(&mut self, resolution: outcome::Resolution) {
        self.record(&resolution.log_line);
        match resolution.outcome {
            TaskOutcome::Downloaded => self.state.tally.downloaded += 1,
            TaskOutcome::Skipped(_) => self.state.tally.skipped += 1,
            TaskOutcome::Failed(message) => {
                self.state.tally.failed += 1;
                self.record_failure(message);
            }
        }
        self.state.completed += 1;
        let status = processed_status(self.state.completed, self.state.total, &resolution.detail);
        self.set_status(status);
    }
}
