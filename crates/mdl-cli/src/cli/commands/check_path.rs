//! `mdl check-path` – apply the input path rules to one path.

use anyhow::{bail, Result};
use mdl_core::session::validate_input_path;
use std::path::Path;

pub fn run_check_path(path: &Path) -> Result<()> {
    if !validate_input_path(path) {
        bail!(
            "invalid path: {} (must be absolute and must not contain < > : \" | ? *)",
            path.display()
        );
    }
    let kind = if path.is_dir() {
        "directory"
    } else if path.exists() {
        "file"
    } else {
        "does not exist"
    };
    println!("ok: {} ({})", path.display(), kind);
    Ok(())
}
