//! Filesystem utilities

use std::fs;
use std::path::Path;

use log::info;

/// Create a directory and any missing parents, logging when something was created.
pub fn ensure_dir_exists(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    info!("Created directory: {}", path.display());
    Ok(())
}

/// Check if a path exists
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}
