//! Run state owned by the scheduler: queue, counters, failures.

use std::collections::{HashSet, VecDeque};

use crate::url_model::DownloadTask;

/// Per-outcome counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything that changes while a run progresses. Replaced wholesale when a
/// run starts or is reset; never persisted.
///
/// Invariants kept by the scheduler:
/// `active <= limit`, `completed <= total`, the queue only shrinks (FIFO, no
/// re-enqueue), and each dequeued task adds exactly one to `completed`.
/// `active` is the number of issued fetches whose sequence number has not
/// been settled yet, so a fetch can free its slot only once.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub(super) total: usize,
    pub(super) completed: usize,
    in_flight: HashSet<u64>,
    next_seq: u64,
    pub(super) queue: VecDeque<DownloadTask>,
    pub(super) failures: Vec<String>,
    pub(super) tally: OutcomeTally,
}

impl RunState {
    pub(super) fn with_tasks(tasks: Vec<DownloadTask>) -> Self {
        let queue: VecDeque<DownloadTask> = tasks.into();
        RunState {
            total: queue.len(),
            queue,
            ..RunState::default()
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn active(&self) -> usize {
        self.in_flight.len()
    }

    /// Registers a new fetch and returns its sequence number.
    pub(super) fn begin_fetch(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight.insert(seq);
        seq
    }

    /// Settles fetch `seq`; false if it is not (or no longer) in flight.
    pub(super) fn end_fetch(&mut self, seq: u64) -> bool {
        self.in_flight.remove(&seq)
    }

    /// Tasks not yet dequeued.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn tally(&self) -> OutcomeTally {
        self.tally
    }

    /// True once every task of the run has an outcome.
    pub fn all_completed(&self) -> bool {
        self.completed == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn task(name: &str) -> DownloadTask {
        DownloadTask {
            original_url: format!("example.com/{name}"),
            save_path: PathBuf::from("/out/example_com").join(name),
            file_name: name.to_string(),
        }
    }

    #[test]
    fn with_tasks_sets_total_and_order() {
        let s = RunState::with_tasks(vec![task("a"), task("b"), task("c")]);
        assert_eq!(s.total(), 3);
        assert_eq!(s.queued(), 3);
        assert_eq!(s.completed(), 0);
        assert_eq!(s.active(), 0);
        assert_eq!(s.queue.front().unwrap().file_name, "a");
        assert!(!s.all_completed());
    }

    #[test]
    fn fetch_can_end_only_once() {
        let mut s = RunState::with_tasks(vec![task("a"), task("b")]);
        let a = s.begin_fetch();
        let b = s.begin_fetch();
        assert_ne!(a, b);
        assert_eq!(s.active(), 2);
        assert!(s.end_fetch(a));
        assert!(!s.end_fetch(a));
        assert_eq!(s.active(), 1);
        assert!(!s.end_fetch(b + 10));
        assert!(s.end_fetch(b));
        assert_eq!(s.active(), 0);
    }

    #[test]
    fn default_is_empty_and_complete() {
        let s = RunState::default();
        assert_eq!(s.total(), 0);
        assert!(s.failures().is_empty());
        assert!(s.all_completed());
    }
}
