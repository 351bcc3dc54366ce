//! Input directory scanning

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, CardFitError, ErrorContext};

/// List the files directly under `dir` whose extension the config
/// recognises, sorted by name.
///
/// A missing directory is fatal; a directory with no matching files yields
/// an empty list.
pub fn scan_directory(dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CardFitError::missing_directory(dir));
    }

    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_file_context(dir.to_path_buf())? {
        let path = entry.with_file_context(dir.to_path_buf())?.path();

        if !path.is_file() {
            continue;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if config.is_recognized_extension(ext) => files.push(path),
            _ => debug!("Skipping {:?}", path),
        }
    }

    files.sort();
    info!("Found {} image(s) in {:?}", files.len(), dir);
    Ok(files)
}
