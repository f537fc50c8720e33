// 🖼️ Gallery - Directory listing for the image page

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Names of the regular files in `dir`, sorted by name.
/// Subdirectories are skipped since they cannot be rendered as images.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read gallery directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        if !entry.path().is_file() {
            continue;
        }
        files.push(entry.file_name().to_string_lossy().into_owned());
    }

    files.sort();
    Ok(files)
}

/// Like `list_images`, but an unreadable directory yields an empty gallery
pub fn list_images_or_empty(dir: &Path) -> Vec<String> {
    match list_images(dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "gallery directory unavailable");
            Vec::new()
        }
    }
}

/// `src` attribute for an image: URL prefix plus the percent-encoded file name
pub fn image_src(url_prefix: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        url_prefix.trim_end_matches('/'),
        urlencoding::encode(file_name)
    )
}
