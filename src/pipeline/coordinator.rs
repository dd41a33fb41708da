//! Input enumeration.

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::Result;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Collect the photos directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into and files with other extensions
/// are ignored.
pub fn collect_input_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        } else {
            debug!("Ignoring {}", path.display());
        }
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Check if a file has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(OsStr::new(candidate)))
    })
}
