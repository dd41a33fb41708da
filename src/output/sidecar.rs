//! JSON sidecar records.

use crate::constants::{SIDECAR_EXTENSION, SIDECAR_TEMP_SUFFIX};
use crate::error::{Error, Result};
use crate::output::ImageRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sidecar path of an output image: same directory and stem, `.json` extension.
pub fn sidecar_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension(SIDECAR_EXTENSION)
}

/// Write a record atomically.
///
/// The record is written to `{path}.tmp` and renamed into place, so a failed
/// write never leaves a truncated sidecar behind.
pub fn write_sidecar(path: &Path, record: &ImageRecord) -> Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(SIDECAR_TEMP_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    let result = write_record(&temp_path, path, record).and_then(|()| {
        std::fs::rename(&temp_path, path).map_err(|e| Error::SidecarWrite {
            path: path.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() && temp_path.exists() {
        let _ = std::fs::remove_file(&temp_path);
    }
    if result.is_ok() {
        debug!("Wrote sidecar {}", path.display());
    }
    result
}

fn write_record(temp_path: &Path, final_path: &Path, record: &ImageRecord) -> Result<()> {
    let write_error = |e| Error::SidecarWrite {
        path: final_path.to_path_buf(),
        source: e,
    };

    let file = File::create(temp_path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record).map_err(|e| Error::SidecarSerialize {
        path: final_path.to_path_buf(),
        source: e,
    })?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer
        .into_inner()
        .map_err(|e| write_error(e.into_error()))?
        .sync_all()
        .map_err(write_error)
}

/// Read a sidecar record.
pub fn read_sidecar(path: &Path) -> Result<ImageRecord> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::SidecarRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| Error::SidecarRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::inference::BoundingBox;
    use crate::output::AcceptedDetection;

    fn record() -> ImageRecord {
        ImageRecord::new(
            "trail_cam_photos/IMG_0042.JPG",
            vec![
                AcceptedDetection {
                    animal: "deer".to_string(),
                    confidence: 0.913,
                    bbox: BoundingBox::new(80.0, 70.0, 120.0, 130.0),
                },
                AcceptedDetection {
                    animal: "deer".to_string(),
                    confidence: 0.42,
                    bbox: BoundingBox::new(300.5, 10.0, 420.0, 200.25),
                },
            ],
        )
    }

    #[test]
    fn test_sidecar_path_for() {
        assert_eq!(
            sidecar_path_for(Path::new("out/2024-03-01_08-15-30_deer.jpg")),
            PathBuf::from("out/2024-03-01_08-15-30_deer.json")
        );
    }

    #[test]
    fn test_write_then_read_preserves_detections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-03-01_08-15-30_deer.json");
        let original = record();

        write_sidecar(&path, &original).unwrap();
        let loaded = read_sidecar(&path).unwrap();

        assert_eq!(loaded, original);
        assert!(!dir.path().join("2024-03-01_08-15-30_deer.json.tmp").exists());
    }

    #[test]
    fn test_sidecar_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        write_sidecar(&path, &record()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["original_file"], "trail_cam_photos/IMG_0042.JPG");
        assert!(value["processed_date"].as_str().unwrap().contains('T'));
        assert_eq!(value["detections"][0]["animal"], "deer");
        assert_eq!(value["detections"][0]["bbox"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_write_into_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("record.json");

        let result = write_sidecar(&path, &record());
        assert!(matches!(result, Err(Error::SidecarWrite { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_invalid_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_sidecar(&path), Err(Error::SidecarRead { .. })));
    }
}
