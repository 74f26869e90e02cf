//! CLI command handlers, one file per subcommand.

mod check_path;
mod completions;
mod resolve;
mod run;

pub use check_path::run_check_path;
pub use completions::{run_completions, run_manpage};
pub use resolve::run_resolve;
pub use run::run_batch;
