pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod manifest;
pub mod run_log;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod url_model;

pub use error::SetupError;
pub use session::{RunSummary, SessionOptions};
