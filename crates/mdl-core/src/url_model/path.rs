//! Splitting a URL path into a local directory chain and a file name.

use super::percent::percent_decode;
use super::sanitize::sanitize_segment;

/// Local layout derived from a URL path: directory components (already
/// decoded and sanitized) and the final file name, if the path names one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PathLayout {
    pub dirs: Vec<String>,
    pub file_name: Option<String>,
}

/// Splits `/a/b/file.deb` into dirs `["a", "b"]` and file name `file.deb`.
///
/// A path that is empty or ends in `/` has no file name; all of its non-empty
/// segments are directories. Empty segments (`//`) are dropped.
pub(super) fn split_url_path(path: &str) -> PathLayout {
    let ends_with_slash = path.is_empty() || path.ends_with('/');
    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| sanitize_segment(&percent_decode(s)))
        .collect();

    let file_name = if ends_with_slash { None } else { segments.pop() };

    PathLayout {
        dirs: segments,
        file_name: file_name.filter(|s| !s.is_empty()),
    }
}
