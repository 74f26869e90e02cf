//! URL manifest parsing: one URL per line, `#` comments and blank lines ignored.

use std::io;
use std::path::Path;

/// Returns the candidate lines of a manifest, trimmed, in file order.
///
/// Every returned line is one task; the count is the run's total and is never
/// recomputed after dispatch starts.
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads the whole manifest file and parses it. Invalid UTF-8 is replaced
/// rather than rejected so a single bad byte does not lose the other lines.
pub fn load_manifest(path: &Path) -> io::Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let entries = parse_manifest(&text);
    tracing::debug!(path = %path.display(), entries = entries.len(), "manifest loaded");
    Ok(entries)
}
