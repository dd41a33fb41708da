//! Label list file reading (species allow-lists and model label files).

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read a label list: one label per line, blank lines and `#` comments skipped.
fn read_label_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut labels = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            labels.push(trimmed.to_string());
        }
    }

    Ok(labels)
}

/// Read a species allow-list file.
///
/// # File Format
/// - One label per line, matching the detector's class names (e.g. `deer`)
/// - Blank lines and lines starting with `#` are ignored
pub fn read_species_list(path: &Path) -> Result<Vec<String>> {
    read_label_lines(path).map_err(|e| Error::SpeciesListRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a model labels file. Line order is the model's class index order.
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    read_label_lines(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })
}
