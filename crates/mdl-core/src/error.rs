//! Fatal setup errors: anything that stops a run before its first task.
//!
//! Per-task problems never surface here; the scheduler absorbs them into the
//! failure list.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(
        "{what} path is not valid: {} (must be absolute and must not contain < > : \" | ? *)",
        .path.display()
    )]
    InvalidPath { what: &'static str, path: PathBuf },

    #[error("URL manifest does not exist: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("cannot open URL manifest {}: {source}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("cannot create log directory {}: {source}", .path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
