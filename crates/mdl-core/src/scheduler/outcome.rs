//! Outcome classification and the log/status text for each outcome.

use std::path::Path;

use crate::fetch::{is_html_content_type, FetchOutcome, HttpResponse, ResponseBody};
use crate::storage;
use crate::url_model::{DownloadTask, InvalidUrl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A file was already present at the save path; no fetch was issued.
    AlreadyExists,
    /// The server answered with an HTML/XHTML page instead of a file.
    HtmlContent,
}

/// Terminal outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Downloaded,
    Skipped(SkipReason),
    /// Carries the entry appended to the run's failure list.
    Failed(String),
}

/// What a completed task contributes: its outcome, the run-log line and the
/// status detail shown after `已处理 X/Y:`.
#[derive(Debug, Clone)]
pub(super) struct Resolution {
    pub outcome: TaskOutcome,
    pub log_line: String,
    pub detail: String,
}

/// Decision on a finished fetch, taken before anything touches the disk.
/// First matching rule wins.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Verdict<'a> {
    Transport(&'a str),
    HttpStatus { status: u32, reason: &'a str },
    Html(&'a str),
    Save(&'a ResponseBody),
}

pub(super) fn judge(outcome: &FetchOutcome) -> Verdict<'_> {
    match outcome {
        FetchOutcome::Transport(err) => Verdict::Transport(err),
        FetchOutcome::Response(HttpResponse {
            status,
            reason,
            content_type,
            body,
        }) => {
            if !(200..300).contains(status) {
                return Verdict::HttpStatus {
                    status: *status,
                    reason,
                };
            }
            match content_type.as_deref() {
                Some(ct) if is_html_content_type(ct) => Verdict::Html(ct),
                _ => Verdict::Save(body),
            }
        }
    }
}

pub(super) fn invalid_url(task: &DownloadTask, err: &InvalidUrl) -> Resolution {
    Resolution {
        outcome: TaskOutcome::Failed(format!(
            "下载失败: {} (错误: 原始格式非法或补全后仍无效: {})",
            task.original_url, err
        )),
        log_line: format!("[下载失败] 无效URL: {} (原因: {})", task.original_url, err),
        detail: format!("跳过无效URL“{}”", task.file_name),
    }
}

pub(super) fn already_exists(task: &DownloadTask) -> Resolution {
    Resolution {
        outcome: TaskOutcome::Skipped(SkipReason::AlreadyExists),
        log_line: format!("[跳过] 文件已存在: {}", task.save_path.display()),
        detail: format!("“{}”已存在，跳过", task.file_name),
    }
}

pub(super) fn dir_failed(task: &DownloadTask, dir: &Path, err: &std::io::Error) -> Resolution {
    Resolution {
        outcome: TaskOutcome::Failed(format!(
            "下载失败: 目录创建失败: {} (URL: {})",
            dir.display(),
            task.original_url
        )),
        log_line: format!(
            "[下载失败] 无法创建本地目录: {} (URL: {}) 错误: {}",
            dir.display(),
            task.original_url,
            err
        ),
        detail: format!("下载错误“{}” (目录)", task.file_name),
    }
}

/// Classifies a finished fetch and, for a 2xx non-HTML response, moves the
/// body into the task's save path.
pub(super) fn resolve_completion(task: &DownloadTask, outcome: &FetchOutcome) -> Resolution {
    let url = &task.original_url;
    let name = &task.file_name;
    let verdict = judge(outcome);
    if !matches!(verdict, Verdict::Save(_)) {
        discard_body(outcome);
    }
    match verdict {
        Verdict::Transport(err) => Resolution {
            outcome: TaskOutcome::Failed(format!("[下载失败]: {} (错误: {})", url, err)),
            log_line: format!("[下载失败] 下载失败: {} 错误: {}", url, err),
            detail: format!("下载错误“{}” (网络或URL问题)", name),
        },
        Verdict::HttpStatus { status, reason } => Resolution {
            outcome: TaskOutcome::Failed(format!("服务器错误 {} ({}): {}", status, reason, url)),
            log_line: format!("[下载失败] 服务器返回状态码 {}: {} (URL: {})", status, reason, url),
            detail: format!("下载错误“{}” (服务器返回 {})", name, status),
        },
        Verdict::Html(content_type) => Resolution {
            outcome: TaskOutcome::Skipped(SkipReason::HtmlContent),
            log_line: format!("[跳过] 非文件内容 (HTML 页面): {} (URL: {})", content_type, url),
            detail: format!("跳过 HTML 页面“{}”", name),
        },
        Verdict::Save(body) => match store_body(task, body) {
            Ok(()) => Resolution {
                outcome: TaskOutcome::Downloaded,
                log_line: format!("[下载完成] {} -> {}", url, task.save_path.display()),
                detail: format!("“{}”下载完成", name),
            },
            Err(e) => Resolution {
                outcome: TaskOutcome::Failed(format!("文件保存失败: {} (错误: {})", url, e)),
                log_line: format!(
                    "[下载失败] 文件保存失败: 无法保存到 {} (URL: {}) 错误: {}",
                    task.save_path.display(),
                    url,
                    e
                ),
                detail: format!("下载错误“{}” (文件保存失败)", name),
            },
        },
    }
}

/// Moves a kept body to the task's save path.
fn store_body(task: &DownloadTask, body: &ResponseBody) -> Result<(), String> {
    match body {
        ResponseBody::Staged(temp) => storage::commit_temp(temp, &task.save_path).map_err(|e| {
            storage::discard_temp(temp);
            format!("{:#}", e)
        }),
        ResponseBody::Buffered(bytes) => {
            storage::save_body(&task.save_path, bytes).map_err(|e| format!("{:#}", e))
        }
        ResponseBody::WriteFailed(e) => Err(e.clone()),
        ResponseBody::Discarded => Err("response body was not kept".to_string()),
    }
}

/// Removes a staged temp file that will not be committed.
pub(super) fn discard_body(outcome: &FetchOutcome) {
    if let FetchOutcome::Response(HttpResponse {
        body: ResponseBody::Staged(temp),
        ..
    }) = outcome
    {
        storage::discard_temp(temp);
    }
}
