//! Response header helpers.

/// Media types that are pages rather than files; such responses are skipped.
const HTML_MEDIA_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

/// True if a `Content-Type` value names an HTML or XHTML page
/// (case-insensitive, parameters such as `; charset=utf-8` ignored).
pub fn is_html_content_type(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_MEDIA_TYPES.iter().any(|t| media == *t)
}

fn is_status_line(line: &str) -> bool {
    line.as_bytes()
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case(b"HTTP/"))
}

/// Status and content type of the response being received, updated one
/// header line at a time. A new status line (next redirect hop) starts over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_type: Option<String>,
}

impl ResponseHead {
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if is_status_line(line) {
            *self = ResponseHead {
                status: line.split_whitespace().nth(1).and_then(|c| c.parse().ok()),
                content_type: None,
            };
        } else if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.trim().to_string());
            }
        }
    }

    /// True when the body of this response is a file to keep: 2xx and not a page.
    pub fn wants_body(&self) -> bool {
        wants_body(self.status, self.content_type.as_deref())
    }
}

/// 2xx and not HTML/XHTML.
pub fn wants_body(status: Option<u32>, content_type: Option<&str>) -> bool {
    matches!(status, Some(200..=299)) && !content_type.is_some_and(is_html_content_type)
}

/// Reason phrase of the last status line among the collected header lines.
///
/// With redirects libcurl reports every hop's headers; only the final
/// response matters. HTTP/2 status lines carry no phrase, which yields `None`.
pub fn reason_phrase(lines: &[String]) -> Option<String> {
    let status_line = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| is_status_line(l))
        .last()?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next()?;
    let _code = parts.next()?;
    let reason = parts.next()?.trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}
