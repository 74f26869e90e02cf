//! libcurl-backed GET, one easy handle per request on tokio's blocking pool.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::parse::{reason_phrase, wants_body, ResponseHead};
use super::{
    CompletionSender, FetchCompletion, FetchOutcome, FetchRequest, Fetcher, HttpResponse,
    ResponseBody,
};
use crate::config::MdlConfig;
use crate::storage::{self, StorageWriter};

/// Transfer limits applied to every GET. The scheduler has no timeout of its
/// own, so these are what guarantee every fetch eventually completes.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Hard wall-clock limit for the whole transfer.
    pub timeout: Duration,
    /// Abort if throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&MdlConfig::default())
    }
}

impl FetchOptions {
    pub fn from_config(cfg: &MdlConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            max_redirections: cfg.max_redirections,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Performs one GET. Blocks the current thread; call from `spawn_blocking`
/// when used from async code.
///
/// A body that [`wants_body`] accepts is streamed into `temp_path` as it
/// arrives and reported as [`ResponseBody::Staged`]; every other body is
/// dropped. Never fails: transport problems are reported as
/// [`FetchOutcome::Transport`], and no temp file is left behind for them.
pub fn get(url: &str, temp_path: &Path, opts: &FetchOptions) -> FetchOutcome {
    let mut sink = BodySink::new(temp_path.to_path_buf());
    let result = perform_get(url, opts, &mut sink);
    match result {
        Ok((status, reason, content_type)) => {
            let body = sink.finish(wants_body(Some(status), content_type.as_deref()));
            FetchOutcome::Response(HttpResponse {
                status,
                reason,
                content_type,
                body,
            })
        }
        Err((e, (status, reason, content_type))) => match sink.take_error() {
            // The transfer was aborted by our own write callback.
            Some(write_err) => {
                sink.abandon();
                FetchOutcome::Response(HttpResponse {
                    status,
                    reason,
                    content_type,
                    body: ResponseBody::WriteFailed(write_err),
                })
            }
            None => {
                sink.abandon();
                FetchOutcome::Transport(describe_curl_error(&e))
            }
        },
    }
}

/// Status, reason phrase and content type of the final response.
type Head = (u32, String, Option<String>);

/// Receives body chunks; opens the temp file lazily on the first chunk of a
/// response worth keeping.
struct BodySink {
    temp_path: PathBuf,
    writer: Option<StorageWriter>,
    error: Option<String>,
    /// Bytes received for a response that was not kept.
    dropped: u64,
}

impl BodySink {
    fn new(temp_path: PathBuf) -> Self {
        BodySink {
            temp_path,
            writer: None,
            error: None,
            dropped: 0,
        }
    }

    /// Returns false to abort the transfer.
    fn accept(&mut self, head: &ResponseHead, data: &[u8]) -> bool {
        if !head.wants_body() {
            self.dropped += data.len() as u64;
            return true;
        }
        if self.writer.is_none() {
            match StorageWriter::create(&self.temp_path) {
                Ok(w) => self.writer = Some(w),
                Err(e) => return self.fail(e),
            }
        }
        let res = match self.writer.as_mut() {
            Some(w) => w.write_all(data),
            None => Ok(()),
        };
        match res {
            Ok(()) => true,
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: anyhow::Error) -> bool {
        tracing::warn!(path = %self.temp_path.display(), "body write failed: {:#}", e);
        self.error = Some(format!("{:#}", e));
        false
    }

    fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// Settles the body once the transfer is done. `keep` is the decision
    /// taken from the final status and content type.
    fn finish(mut self, keep: bool) -> ResponseBody {
        if let Some(e) = self.error.take() {
            self.abandon();
            return ResponseBody::WriteFailed(e);
        }
        if !keep {
            self.abandon();
            return ResponseBody::Discarded;
        }
        if self.writer.is_none() && self.dropped > 0 {
            // Headers seen during the transfer disagreed with the final ones.
            return ResponseBody::WriteFailed("response body was not captured".to_string());
        }
        // An empty 2xx body never reaches the write callback; still produce a file.
        let writer = match self.writer.take() {
            Some(w) => Ok(w),
            None => StorageWriter::create(&self.temp_path),
        };
        match writer.and_then(StorageWriter::close) {
            Ok(path) => ResponseBody::Staged(path),
            Err(e) => {
                self.abandon();
                ResponseBody::WriteFailed(format!("{:#}", e))
            }
        }
    }

    fn abandon(&mut self) {
        if let Some(w) = self.writer.take() {
            let path = w.temp_path().to_path_buf();
            drop(w);
            storage::discard_temp(&path);
        } else {
            storage::discard_temp(&self.temp_path);
        }
    }
}

fn perform_get(
    url: &str,
    opts: &FetchOptions,
    sink: &mut BodySink,
) -> Result<Head, (curl::Error, Head)> {
    let mut headers: Vec<String> = Vec::new();
    let head = RefCell::new(ResponseHead::default());
    let mut easy = curl::easy::Easy::new();

    let performed = (|| -> Result<(), curl::Error> {
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(opts.max_redirections)?;
        easy.connect_timeout(opts.connect_timeout)?;
        easy.low_speed_limit(opts.low_speed_limit)?;
        easy.low_speed_time(opts.low_speed_time)?;
        easy.timeout(opts.timeout)?;
        if let Some(ua) = opts.user_agent.as_deref() {
            easy.useragent(ua)?;
        }

        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            let line = String::from_utf8_lossy(data);
            let line = line.trim_end();
            head.borrow_mut().push_line(line);
            headers.push(line.to_string());
            true
        })?;
        // Status and content type are known before the first body byte.
        transfer.write_function(|data| {
            if sink.accept(&head.borrow(), data) {
                Ok(data.len())
            } else {
                Ok(0)
            }
        })?;
        transfer.perform()
    })();

    let final_head = (
        easy.response_code().unwrap_or(0),
        reason_phrase(&headers).unwrap_or_default(),
        easy.content_type().ok().flatten().map(str::to_string),
    );
    match performed {
        Ok(()) => Ok(final_head),
        Err(e) => Err((e, final_head)),
    }
}

fn describe_curl_error(e: &curl::Error) -> String {
    match e.extra_description() {
        Some(extra) if !extra.is_empty() => format!("{} ({})", e, extra),
        _ => e.to_string(),
    }
}

/// Production fetcher: each request runs [`get`] on tokio's blocking pool,
/// streaming into the task's temp file, and reports back over the completion
/// channel.
///
/// `issue` must be called from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: FetchOptions,
}

impl CurlFetcher {
    pub fn new(opts: FetchOptions) -> Self {
        Self { opts }
    }
}

impl Fetcher for CurlFetcher {
    fn issue(&self, request: FetchRequest, done: CompletionSender) {
        let opts = self.opts.clone();
        tokio::task::spawn_blocking(move || {
            let FetchRequest {
                url,
                temp_path,
                ticket,
            } = request;
            let outcome = catch_unwind(AssertUnwindSafe(|| get(url.as_str(), &temp_path, &opts)))
                .unwrap_or_else(|_| {
                    storage::discard_temp(&temp_path);
                    FetchOutcome::Transport("fetch worker panicked".to_string())
                });
            tracing::trace!(url = %url, "fetch finished");
            // The receiver is gone only when the run was torn down; nothing to report to.
            let _ = done.send(FetchCompletion { ticket, outcome });
        });
    }
}
