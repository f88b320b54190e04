//! Writing generated images to disk.

use std::fs;
use std::path::{Path, PathBuf};

use nai::GeneratedAsset;
use tracing::debug;

use crate::error::Result;

/// Writes `data` to `dir/filename`, creating `dir` if needed.
pub fn save_file(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    fs::write(&path, data)?;
    debug!(target = "nai", path = %path.display(), bytes = data.len(), "saved image");
    Ok(path)
}

/// Saves every asset under `dir` with its generated filename.
pub fn save_assets(dir: &Path, assets: &[GeneratedAsset]) -> Result<Vec<PathBuf>> {
    assets
        .iter()
        .map(|asset| save_file(dir, asset.filename(), asset.data()))
        .collect()
}
