//! URL modeling and local path derivation.
//!
//! Turns one manifest line into a [`DownloadTask`]: the URL as written, the
//! mirrored save path under the output root, and a display file name.
//! Everything here is pure: no filesystem or network access.

mod path;
mod percent;
mod sanitize;

use serde::Serialize;
use std::path::{Path, PathBuf};
use url::{Host, Url};

pub use sanitize::sanitize_segment;

use path::split_url_path;

/// File name used when the URL path is empty or ends in `/`.
pub const UNKNOWN_FILE_NAME: &str = "unknown_file";

/// First-level directory used when the URL has no host.
pub const LOCAL_FILES_DIR: &str = "local_files";

/// Scheme prepended to manifest lines written without one.
const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// One manifest entry resolved to where it will be saved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTask {
    /// The manifest line exactly as written (trimmed).
    pub original_url: String,
    /// Absolute target path: `<root>/<host_dir>/<url dirs>/<file_name>`.
    pub save_path: PathBuf,
    /// Display name; also the last component of `save_path`.
    pub file_name: String,
}

/// Why a manifest URL cannot be fetched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUrl {
    #[error("{0}")]
    Parse(#[from] url::ParseError),
    #[error("URL has no usable host")]
    MissingHost,
    #[error("invalid character in host: {0}")]
    BadHost(String),
    #[error("URL cannot be used as a base")]
    CannotBeABase,
}

/// Prepends `http://` when the line has no `://` scheme delimiter.
///
/// `"example.com/a"` → `"http://example.com/a"`; `"HTTPS://x"` is left alone.
pub fn complete_scheme(raw: &str) -> String {
    if raw.to_ascii_lowercase().contains("://") {
        raw.to_string()
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{raw}")
    }
}

/// Completes the scheme and parses the result into a URL that can be fetched.
///
/// Beyond what the parser enforces, special schemes (http, https, ftp, ...)
/// must carry a host made of DNS-safe characters; this rejects inputs such as
/// `http://%%%` that some parser versions would otherwise accept.
pub fn fetch_url(raw: &str) -> Result<Url, InvalidUrl> {
    let url = Url::parse(&complete_scheme(raw))?;
    if url.cannot_be_a_base() {
        return Err(InvalidUrl::CannotBeABase);
    }
    if url.host_str().unwrap_or("").is_empty() {
        if is_special_network_scheme(url.scheme()) {
            return Err(InvalidUrl::MissingHost);
        }
        return Ok(url);
    }
    if let Some(Host::Domain(domain)) = url.host() {
        if let Some(c) = domain.chars().find(|c| !is_host_char(*c)) {
            return Err(InvalidUrl::BadHost(c.to_string()));
        }
    }
    Ok(url)
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

fn is_special_network_scheme(scheme: &str) -> bool {
    matches!(scheme, "http" | "https" | "ftp" | "ws" | "wss")
}

/// First-level local directory for a host: dots become underscores.
///
/// An empty or missing host maps to [`LOCAL_FILES_DIR`].
pub fn host_dir(host: Option<&str>) -> String {
    match host {
        Some(h) if !h.is_empty() => sanitize_segment(&h.replace('.', "_")),
        _ => LOCAL_FILES_DIR.to_string(),
    }
}

/// Resolves one manifest line against `output_root`.
///
/// Never fails: a line that does not parse as a URL still yields a task
/// (under [`LOCAL_FILES_DIR`] / [`UNKNOWN_FILE_NAME`]) and is rejected later
/// by the scheduler when it re-validates the URL at dispatch time.
///
/// # Examples
///
/// - `resolve_task("example.com/a/b.txt", "/out")` → save path
///   `/out/example_com/a/b.txt`, file name `b.txt`
/// - `resolve_task("example.com", "/out")` → file name `unknown_file`
pub fn resolve_task(line: &str, output_root: &Path) -> DownloadTask {
    let (host, layout) = match fetch_url(line) {
        Ok(url) => (url.host_str().map(str::to_string), split_url_path(url.path())),
        Err(_) => (None, split_url_path("")),
    };

    let file_name = layout
        .file_name
        .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string());

    let mut save_path = output_root.join(host_dir(host.as_deref()));
    for dir in &layout.dirs {
        save_path.push(dir);
    }
    save_path.push(&file_name);

    DownloadTask {
        original_url: line.to_string(),
        save_path,
        file_name,
    }
}
