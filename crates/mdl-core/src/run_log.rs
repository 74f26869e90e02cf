//! Per-run download log written next to the mirrored files.
//!
//! Every event is one timestamped line, flushed as soon as it is written so
//! the log survives an abrupt exit. Failures are also kept in memory and
//! replayed as a recap block when the run closes.

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SetupError;

/// Subdirectory of the output root that holds run logs.
pub const LOG_DIR_NAME: &str = "logFiles";

const START_BANNER: &str = "--- 下载任务开始：";
const COMPLETE_BANNER: &str = "--- 所有下载任务已完成 ---";
const RESET_BANNER: &str = "--- 下载任务已重置 ---";
const EMPTY_BANNER: &str = "--- 没有文件需要下载 ---";
const ABORT_BANNER: &str = "--- 下载任务已中止 ---";
const FAILURE_RECAP_HEADER: &str = "--- 以下文件未成功下载/处理 ---";
const FAILURE_RECAP_FOOTER: &str = "--------------------------------";

/// `download_log_<yyyyMMdd_HHmmss>.txt`
pub fn log_file_name(at: &DateTime<Local>) -> String {
    format!("download_log_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Append-only run log plus the in-memory failure list.
#[derive(Debug)]
pub struct RunLogger {
    path: PathBuf,
    out: Option<BufWriter<File>>,
    failures: Vec<String>,
}

impl RunLogger {
    /// Creates `<output_root>/logFiles` if needed and opens a new timestamp-named
    /// log in append mode.
    pub fn open_run(output_root: &Path) -> Result<Self, SetupError> {
        Self::open_run_at(output_root, Local::now())
    }

    /// Same as [`RunLogger::open_run`] with an explicit start time (names the file).
    pub fn open_run_at(output_root: &Path, started: DateTime<Local>) -> Result<Self, SetupError> {
        let dir = output_root.join(LOG_DIR_NAME);
        fs::create_dir_all(&dir).map_err(|source| SetupError::LogDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(log_file_name(&started));
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SetupError::LogFile {
                path: path.clone(),
                source,
            })?;

        let mut logger = RunLogger {
            path,
            out: Some(BufWriter::new(file)),
            failures: Vec::new(),
        };
        logger.note(&format!(
            "{} {} ---",
            START_BANNER,
            started.format("%Y-%m-%d %H:%M:%S")
        ));
        tracing::debug!(path = %logger.path.display(), "run log opened");
        Ok(logger)
    }

    /// Appends `[HH:MM:SS] line` and flushes.
    pub fn record(&mut self, line: &str) {
        let stamped = format!("[{}] {}", Local::now().format("%H:%M:%S"), line);
        self.write_line(&stamped);
    }

    /// Appends a raw line (banners, recap entries) and flushes.
    pub fn note(&mut self, line: &str) {
        self.write_line(line);
    }

    /// Remembers a failure for the end-of-run recap. Does not touch the file.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    /// Writes the completion banner and the failure recap, then closes the file.
    /// Calling it again is a no-op.
    pub fn close_run(&mut self) {
        if !self.is_open() {
            return;
        }
        self.note(COMPLETE_BANNER);
        if !self.failures.is_empty() {
            self.note("");
            self.note(FAILURE_RECAP_HEADER);
            let failures = std::mem::take(&mut self.failures);
            for failure in &failures {
                self.note(failure);
            }
            self.failures = failures;
            self.note(FAILURE_RECAP_FOOTER);
        }
        self.out = None;
        tracing::debug!(path = %self.path.display(), "run log closed");
    }

    /// Closes the log of a run that was reset before finishing.
    pub fn abandon(&mut self) {
        if !self.is_open() {
            return;
        }
        self.note(RESET_BANNER);
        self.out = None;
    }

    /// Closes the log of a run whose manifest had no entries.
    pub fn close_empty(&mut self) {
        if !self.is_open() {
            return;
        }
        self.note(EMPTY_BANNER);
        self.out = None;
    }

    /// Closes the log of a run that stopped during setup, stating the reason.
    pub fn close_aborted(&mut self, reason: &str) {
        if !self.is_open() {
            return;
        }
        self.record(&format!("[错误] {}", reason));
        self.note(ABORT_BANNER);
        self.out = None;
    }

    fn write_line(&mut self, line: &str) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        let res = out
            .write_all(line.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .and_then(|_| out.flush());
        if let Err(e) = res {
            tracing::warn!(path = %self.path.display(), "run log write failed: {}", e);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn file_name_format() {
        assert_eq!(log_file_name(&fixed_time()), "download_log_20240309_070501.txt");
    }

    #[test]
    fn open_creates_log_dir_and_banner() {
        let root = tempfile::tempdir().unwrap();
        let logger = RunLogger::open_run_at(root.path(), fixed_time()).unwrap();
        let expected = root
            .path()
            .join("logFiles")
            .join("download_log_20240309_070501.txt");
        assert_eq!(logger.path(), expected);
        let text = std::fs::read_to_string(&expected).unwrap();
        assert_eq!(text, "--- 下载任务开始： 2024-03-09 07:05:01 ---\n");
    }

    #[test]
    fn record_is_flushed_immediately() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.record("[开始下载] a -> b");
        let text = std::fs::read_to_string(logger.path()).unwrap();
        let last = text.lines().last().unwrap();
        assert!(last.starts_with('['));
        assert!(last.ends_with("] [开始下载] a -> b"));
    }

    #[test]
    fn failures_stay_out_of_file_until_close() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.record_failure("下载失败: x");
        logger.record_failure("下载失败: y");
        let before = std::fs::read_to_string(logger.path()).unwrap();
        assert!(!before.contains("下载失败: x"));

        logger.close_run();
        assert!(!logger.is_open());
        let text = std::fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let n = lines.len();
        assert_eq!(lines[n - 6], "--- 所有下载任务已完成 ---");
        assert_eq!(lines[n - 5], "");
        assert_eq!(lines[n - 4], "--- 以下文件未成功下载/处理 ---");
        assert_eq!(lines[n - 3], "下载失败: x");
        assert_eq!(lines[n - 2], "下载失败: y");
        assert_eq!(lines[n - 1], "--------------------------------");
        assert_eq!(logger.failures().len(), 2);
    }

    #[test]
    fn close_without_failures_has_no_recap() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.close_run();
        logger.close_run();
        let text = std::fs::read_to_string(logger.path()).unwrap();
        assert_eq!(text.matches("所有下载任务已完成").count(), 1);
        assert!(!text.contains("以下文件未成功下载"));
    }

    #[test]
    fn writes_after_close_are_dropped() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.abandon();
        logger.record("late");
        let text = std::fs::read_to_string(logger.path()).unwrap();
        assert!(text.contains("下载任务已重置"));
        assert!(!text.contains("late"));
    }

    #[test]
    fn empty_run_has_no_completion_banner() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.close_empty();
        let text = std::fs::read_to_string(logger.path()).unwrap();
        assert!(text.ends_with("--- 没有文件需要下载 ---\n"));
        assert!(!text.contains("所有下载任务已完成"));
    }

    #[test]
    fn aborted_run_states_reason() {
        let root = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::open_run(root.path()).unwrap();
        logger.close_aborted("无法打开URL列表文件: /x");
        logger.record("late");
        let text = std::fs::read_to_string(logger.path()).unwrap();
        assert!(text.contains("[错误] 无法打开URL列表文件: /x"));
        assert!(text.ends_with("--- 下载任务已中止 ---\n"));
        assert!(!text.contains("所有下载任务已完成"));
        assert!(!text.contains("late"));
    }

    #[test]
    fn open_fails_when_root_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let file_root = root.path().join("plain");
        std::fs::write(&file_root, b"x").unwrap();
        let err = RunLogger::open_run(&file_root).unwrap_err();
        assert!(matches!(err, SetupError::LogDir { .. }));
    }
}
