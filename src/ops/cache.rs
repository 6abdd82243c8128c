//! Implementation of `xcfuse cache`.

use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::util::fs;

/// Number of cached manifest descriptions under `dir`.
pub fn manifest_cache_entries(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json") {
            count += 1;
        }
    }
    Ok(count)
}

/// Remove the manifest cache directory and return how many descriptions
/// it held.
pub fn clean_manifest_cache(dir: &Path) -> Result<usize> {
    let count = manifest_cache_entries(dir)?;
    fs::remove_dir_all_if_exists(dir)?;
    tracing::info!("Removed {} cached manifest(s) from {}", count, dir.display());
    Ok(count)
}
