//! Disk side of a finished fetch.
//!
//! Bodies are written to a `.part` file next to the save path, synced, then
//! renamed into place, so an interrupted write never leaves a file that a
//! later run would mistake for a completed download. Streamed fetches stage
//! into [`staging_path`]; buffered bodies go through [`save_body`].

mod writer;

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

pub use writer::StorageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Per-fetch temp file next to `final_path`: `<final_path>.<run>-<seq>.part`.
/// Two fetches for the same target never share a temp file.
pub fn staging_path(final_path: &Path, run: u64, seq: u64) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(format!(".{}-{}{}", run, seq, TEMP_SUFFIX));
    PathBuf::from(o)
}

/// Makes sure the parent directory of `path` exists, creating the whole chain if needed.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Renames a fully written temp file onto `final_path`.
pub fn commit_temp(temp_path: &Path, final_path: &Path) -> Result<()> {
    std::fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            final_path.display()
        )
    })
}

/// Removes a temp file that will not be committed. Missing files are fine.
pub fn discard_temp(temp_path: &Path) {
    match std::fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::debug!(path = %temp_path.display(), "could not remove temp file: {}", e),
    }
}

/// Writes `body` to `final_path` through a temp file. On failure the temp file
/// is removed and `final_path` is left untouched.
pub fn save_body(final_path: &Path, body: &[u8]) -> Result<()> {
    let tp = temp_path(final_path);
    let res = (|| -> Result<()> {
        let mut writer = StorageWriter::create(&tp)?;
        writer.write_all(body)?;
        writer.sync()?;
        writer.finalize(final_path)
    })();
    if res.is_err() {
        discard_temp(&tp);
    }
    res
}
