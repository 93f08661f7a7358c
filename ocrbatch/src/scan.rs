use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::format::is_supported;

/// Recursively collect supported image files under `root`, sorted by path.
///
/// Symlinks are not followed. Entries that cannot be read are logged and
/// skipped rather than aborting the scan.
pub fn collect_image_paths(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(&path.to_string_lossy()))
        .collect();

    files.sort();
    tracing::debug!(root = %root.display(), found = files.len(), "Directory scan complete");
    files
}
