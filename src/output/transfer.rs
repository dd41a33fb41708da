//! Copying and moving photos into the output directory.

use crate::config::TransferMode;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Place `source` at `destination` according to `mode`.
///
/// Copies keep the source modification time. Moves fall back to
/// copy-and-delete when a rename is impossible (e.g. across filesystems).
pub fn transfer_image(source: &Path, destination: &Path, mode: TransferMode) -> Result<()> {
    let transfer_error = |e| Error::ImageTransfer {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    match mode {
        TransferMode::Copy => copy_preserving_mtime(source, destination).map_err(transfer_error),
        TransferMode::Move => {
            if let Err(e) = std::fs::rename(source, destination) {
                debug!(
                    "Rename of {} failed ({e}), copying instead",
                    source.display()
                );
                copy_preserving_mtime(source, destination).map_err(transfer_error)?;
                std::fs::remove_file(source).map_err(transfer_error)?;
            }
            Ok(())
        }
    }
}

fn copy_preserving_mtime(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::fs::copy(source, destination)?;
    let modified = std::fs::metadata(source)?.modified()?;
    File::options()
        .write(true)
        .open(destination)?
        .set_modified(modified)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_copy_keeps_source_and_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("IMG_0001.JPG");
        let destination = dir.path().join("2024-03-01_08-15-30_deer.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_709_280_930);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        transfer_image(&source, &destination, TransferMode::Copy).unwrap();

        assert!(source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"jpeg bytes");
        assert_eq!(
            std::fs::metadata(&destination).unwrap().modified().unwrap(),
            mtime
        );
    }

    #[test]
    fn test_move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("IMG_0002.jpg");
        let destination = dir.path().join("moved.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        transfer_image(&source, &destination, TransferMode::Move).unwrap();

        assert!(!source.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_missing_source_is_transfer_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = transfer_image(
            &dir.path().join("missing.jpg"),
            &dir.path().join("out.jpg"),
            TransferMode::Copy,
        );
        assert!(matches!(result, Err(Error::ImageTransfer { .. })));
        assert!(result.unwrap_err().is_image_local());
    }
}
