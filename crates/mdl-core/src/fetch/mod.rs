//! Fetch capability used by the scheduler.
//!
//! The scheduler never waits on a transfer. It hands a [`FetchRequest`] to a
//! [`Fetcher`] together with a completion sender; the fetcher performs the GET
//! on its own schedule and sends exactly one [`FetchCompletion`] back. The
//! [`FetchTicket`] travels with the request and comes back unchanged, so the
//! scheduler can tell which task (and which run) a completion belongs to.
//!
//! Bodies worth keeping are streamed by the fetcher into the request's
//! `temp_path` and only renamed into place by the scheduler once the outcome
//! is known.

mod transfer;
mod parse;

use std::path::PathBuf;
use tokio::sync::mpsc;
use url::Url;

use crate::url_model::DownloadTask;

pub use self::transfer::{get, CurlFetcher, FetchOptions};
pub use self::parse::{is_html_content_type, reason_phrase, wants_body, ResponseHead};

/// Identifies one run of the scheduler. Completions carrying an older id are stale.
pub type RunId = u64;

/// Correlation record attached to every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub run: RunId,
    /// Unique per issued fetch within a run; a completion is accepted only
    /// while its sequence number is still in flight.
    pub seq: u64,
    pub task: DownloadTask,
}

/// One GET to perform.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Scheme-completed URL; may differ from `ticket.task.original_url`.
    pub url: Url,
    /// Where a streaming fetcher stages the body before it is committed.
    pub temp_path: PathBuf,
    pub ticket: FetchTicket,
}

/// A response that reached the HTTP layer (any status).
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u32,
    pub reason: String,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

/// Where the body of a response ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// Not kept: error status or an HTML page.
    #[default]
    Discarded,
    /// Fully written and synced to this temp file, waiting to be renamed.
    Staged(PathBuf),
    /// Held in memory; for fetchers that do not stream to disk.
    Buffered(Vec<u8>),
    /// The body could not be written locally.
    WriteFailed(String),
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Connection, DNS, TLS, timeout or any other failure below HTTP.
    Transport(String),
    Response(HttpResponse),
}

#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub ticket: FetchTicket,
    pub outcome: FetchOutcome,
}

pub type CompletionSender = mpsc::UnboundedSender<FetchCompletion>;
pub type CompletionReceiver = mpsc::UnboundedReceiver<FetchCompletion>;

/// Performs GETs asynchronously.
///
/// Implementations must send exactly one completion per issued request, even
/// when the transfer fails or times out; a request that never completes
/// holds a concurrency slot forever. A body that [`wants_body`] accepts is
/// either staged at `temp_path` or buffered.
pub trait Fetcher: Send + Sync {
    fn issue(&self, request: FetchRequest, done: CompletionSender);
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn issue(&self, request: FetchRequest, done: CompletionSender) {
        (**self).issue(request, done)
    }
}
