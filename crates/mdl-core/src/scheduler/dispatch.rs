//! The pump: admits queued tasks while there is a free concurrency slot.

use crate::fetch::{FetchRequest, FetchTicket, Fetcher};
use crate::storage;
use crate::url_model::{fetch_url, DownloadTask};

use super::outcome;
use super::progress::processed_status;
use super::DownloadScheduler;

impl<F: Fetcher> DownloadScheduler<F> {
    /// Dequeues tasks in FIFO order while `active < limit`.
    ///
    /// A task that can be settled without the network (invalid URL, file
    /// already present, parent directory not creatable) completes on the spot
    /// and does not take a slot; everything else is handed to the fetcher and
    /// the pump moves on without waiting. Calling this with nothing to do is a no-op.
    pub fn dispatch(&mut self) {
        while self.live && self.state.active() < self.limit {
            let Some(task) = self.state.queue.pop_front() else {
                break;
            };
            self.admit(task);
        }
    }

    fn admit(&mut self, task: DownloadTask) {
        let url = match fetch_url(&task.original_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %task.original_url, "invalid URL: {}", e);
                self.settle(outcome::invalid_url(&task, &e));
                self.finish_if_done();
                return;
            }
        };

        if task.save_path.exists() {
            self.settle(outcome::already_exists(&task));
            self.finish_if_done();
            return;
        }

        if let Err(e) = storage::ensure_parent_dir(&task.save_path) {
            let dir = task
                .save_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            tracing::warn!(dir = %dir.display(), "cannot create directory: {}", e);
            self.settle(outcome::dir_failed(&task, &dir, &e));
            self.finish_if_done();
            return;
        }

        self.record(&format!(
            "[开始下载] {} -> {}",
            task.original_url,
            task.save_path.display()
        ));
        let seq = self.state.begin_fetch();
        let status = processed_status(
            self.state.completed,
            self.state.total,
            &format!("正在下载“{}”...", task.file_name),
        );
        self.set_status(status);

        let request = FetchRequest {
            url,
            temp_path: storage::staging_path(&task.save_path, self.run_id, seq),
            ticket: FetchTicket {
                run: self.run_id,
                seq,
                task,
            },
        };
        tracing::debug!(url = %request.url, seq, active = self.state.active(), "fetch issued");
        self.fetcher.issue(request, self.completion_tx.clone());
    }
}
