//! Output file naming.

use crate::config::NamingConfig;
use crate::constants::naming::{FORBIDDEN_CHARS, HASH_SUFFIX_LEN};
use crate::output::AcceptedDetection;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Options controlling output names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    /// `chrono` format of the timestamp prefix.
    pub date_format: String,
    /// Separator between species names.
    pub separator: String,
    /// Token used when no species was accepted.
    pub no_wildlife_token: String,
    /// Maximum number of species in a name.
    pub max_species: Option<usize>,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self::from(&NamingConfig::default())
    }
}

impl From<&NamingConfig> for NamingOptions {
    fn from(config: &NamingConfig) -> Self {
        Self {
            date_format: config.date_format.clone(),
            separator: config.separator.clone(),
            no_wildlife_token: config.no_wildlife_token.clone(),
            max_species: config.max_species,
        }
    }
}

/// Derive the output file name of a photo.
///
/// `{date}_{species}{.ext}`: species are deduplicated and sorted so the
/// result does not depend on detection order. Labels differing only in case
/// count once, spelled as first seen. The extension is lower-cased.
pub fn output_name(
    original: &Path,
    taken: NaiveDateTime,
    detections: &[AcceptedDetection],
    options: &NamingOptions,
) -> String {
    let mut species: BTreeMap<String, String> = BTreeMap::new();
    for label in detections.iter().map(|d| sanitize_label(&d.animal)) {
        if !label.is_empty() {
            species.entry(label.to_lowercase()).or_insert(label);
        }
    }

    let species_part = if species.is_empty() {
        options.no_wildlife_token.clone()
    } else {
        let limit = options.max_species.unwrap_or(usize::MAX);
        species
            .into_values()
            .take(limit)
            .collect::<Vec<_>>()
            .join(&options.separator)
    };

    let mut name = format!("{}_{species_part}", taken.format(&options.date_format));
    if let Some(ext) = original.extension() {
        let _ = write!(name, ".{}", ext.to_string_lossy().to_lowercase());
    }
    name
}

/// Insert a short hash of the original path before the extension.
///
/// `2024-03-01_08-15-30_deer.jpg` becomes `2024-03-01_08-15-30_deer_1a2b3c4d.jpg`.
pub fn disambiguate(name: &str, original: &Path) -> String {
    let digest = Sha256::digest(original.to_string_lossy().as_bytes());
    let hash: String = digest
        .iter()
        .take(HASH_SUFFIX_LEN.div_ceil(2))
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
        .chars()
        .take(HASH_SUFFIX_LEN)
        .collect();

    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{hash}.{ext}"),
        None => format!("{name}_{hash}"),
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if FORBIDDEN_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect()
}
