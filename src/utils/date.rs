//! Capture time resolution for trail camera photos.

use crate::constants::exif::DATETIME_FORMAT;
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Where a capture time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// EXIF `DateTime` or `DateTimeOriginal`.
    Exif,
    /// File modification time.
    FileModified,
    /// Neither was readable; the Unix epoch is used.
    Fallback,
}

/// Resolved capture time of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTime {
    /// Local wall-clock time of capture.
    pub taken: NaiveDateTime,
    /// Source of the timestamp.
    pub source: TimeSource,
}

/// Resolve when a photo was taken.
///
/// Tries the EXIF `DateTime` tag first, then `DateTimeOriginal`, then the
/// file modification time. Never fails.
pub fn resolve_capture_time(path: &Path) -> CaptureTime {
    if let Some(taken) = read_exif_datetime(path) {
        return CaptureTime {
            taken,
            source: TimeSource::Exif,
        };
    }

    match file_modified_time(path) {
        Some(taken) => CaptureTime {
            taken,
            source: TimeSource::FileModified,
        },
        None => {
            debug!("No usable timestamp for {}, using epoch", path.display());
            CaptureTime {
                taken: NaiveDateTime::default(),
                source: TimeSource::Fallback,
            }
        }
    }
}

/// Read the EXIF capture timestamp, if present and well formed.
pub fn read_exif_datetime(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .inspect_err(|e| debug!("No EXIF data in {}: {e}", path.display()))
        .ok()?;

    [Tag::DateTime, Tag::DateTimeOriginal]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
        .find_map(|field| match &field.value {
            Value::Ascii(values) => values.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        })
}

/// Parse an EXIF ASCII timestamp (`YYYY:MM:DD HH:MM:SS`).
pub fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).ok()
}

fn file_modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}
