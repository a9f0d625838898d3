//! Discovery of elevation tiles on disk.

use crate::errors::{ColshadeError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Collects all files in `dir` whose extension is `extension` (compared
/// case-insensitively, without the dot), sorted by path.
pub fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ColshadeError::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    files.sort();
    info!("found {} files to process", files.len());
    for file in &files {
        info!(file = %file.display(), "input tile");
    }

    Ok(files)
}
