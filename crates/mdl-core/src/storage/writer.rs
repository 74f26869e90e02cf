//! Sequential writer for a temp download file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writer for a `.part` file that becomes the final file on [`StorageWriter::finalize`].
pub struct StorageWriter {
    file: File,
    temp_path: PathBuf,
}

impl StorageWriter {
    /// Create (or truncate) the temp file at `temp_path`.
    pub fn create(temp_path: &Path) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(StorageWriter {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Append `data` at the current position.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .context("storage write failed")?;
        Ok(())
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("storage sync failed")?;
        Ok(())
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Atomically rename the temp file to the final path. Consumes the writer and closes the file.
    pub fn finalize(self, final_path: &Path) -> Result<()> {
        let StorageWriter { file, temp_path } = self;
        drop(file);
        super::commit_temp(&temp_path, final_path)
    }

    /// Syncs and closes the file, leaving it at [`StorageWriter::temp_path`]
    /// for a later [`super::commit_temp`]. Returns that path.
    pub fn close(self) -> Result<PathBuf> {
        self.sync()?;
        Ok(self.temp_path)
    }
}
