//! Progress reporting for a run (tasks done, in flight, latest event).
//!
//! The scheduler sends one report per state transition; consumers print or
//! display `message` and can derive a fraction from the counters.

/// Status text shown before any run starts and after a reset.
pub const IDLE_STATUS: &str = "等待任务开始...";

/// Status text once every task of the run has completed.
pub const FINISHED_STATUS: &str = "所有任务已完成。";

/// Snapshot of run progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    /// Tasks that reached a terminal outcome.
    pub completed: usize,
    /// Tasks in the run (fixed at start).
    pub total: usize,
    /// Fetches currently in flight.
    pub active: usize,
    /// Human-readable status line, e.g. `已处理 3/10: “a.bin”下载完成`.
    pub message: String,
}

impl ProgressReport {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// `已处理 X/Y: <detail>`
pub(crate) fn processed_status(completed: usize, total: usize, detail: &str) -> String {
    format!("已处理 {}/{}: {}", completed, total, detail)
}
