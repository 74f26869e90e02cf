//! Completion handling and the terminal summary.

use crate::fetch::{FetchCompletion, Fetcher};

use super::outcome;
use super::progress::FINISHED_STATUS;
use super::DownloadScheduler;

impl<F: Fetcher> DownloadScheduler<F> {
    /// Handles the completion of one dispatched fetch, in whatever order
    /// fetches finish: frees its slot, classifies and records the outcome,
    /// refills the freed slot and emits the terminal summary once every task
    /// is done.
    ///
    /// Completions that belong to an earlier (reset or replaced) run are
    /// ignored, as is a second completion for the same fetch. A staged body
    /// carried by an ignored completion is removed.
    pub fn on_fetch_complete(&mut self, completion: FetchCompletion) {
        let FetchCompletion { ticket, outcome: result } = completion;
        if !self.live || ticket.run != self.run_id {
            tracing::debug!(
                ticket_run = ticket.run,
                current_run = self.run_id,
                url = %ticket.task.original_url,
                "ignoring completion from a stale run"
            );
            outcome::discard_body(&result);
            return;
        }
        if !self.state.end_fetch(ticket.seq) {
            tracing::warn!(
                seq = ticket.seq,
                url = %ticket.task.original_url,
                "ignoring completion for a fetch that is not in flight"
            );
            return;
        }

        let resolution = outcome::resolve_completion(&ticket.task, &result);
        self.settle(resolution);

        self.dispatch();
        self.finish_if_done();
    }

    /// Emits the terminal summary exactly once, when the last task completes.
    pub(super) fn finish_if_done(&mut self) {
        if !self.live || !self.state.all_completed() {
            return;
        }
        self.live = false;
        self.finished = true;

        let tally = self.state.tally;
        self.record(&format!(
            "[信息] 共处理 {} 个任务：下载完成 {}，跳过 {}，失败 {}",
            self.state.total, tally.downloaded, tally.skipped, tally.failed
        ));
        if let Some(logger) = self.logger.as_mut() {
            logger.close_run();
        }
        tracing::info!(
            run = self.run_id,
            total = self.state.total,
            downloaded = tally.downloaded,
            skipped = tally.skipped,
            failed = tally.failed,
            "run finished"
        );
        self.set_status(FINISHED_STATUS.to_string());
    }
}
