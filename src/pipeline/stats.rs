//! Run statistics and the end-of-run summary.

use crate::constants::MAX_SUMMARY_ERRORS;
use std::collections::BTreeMap;
use std::fmt;

/// Counters accumulated over one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Photos examined, including failed ones.
    pub total_processed: usize,
    /// Photos with at least one accepted detection.
    pub wildlife_found: usize,
    /// Photos written to the output directory.
    pub saved: usize,
    /// Photos left out of the output (no wildlife, save-all disabled).
    pub skipped: usize,
    /// Accepted detections per species, keyed by lower-cased label.
    pub animals_detected: BTreeMap<String, usize>,
    /// Error messages, in processing order.
    pub errors: Vec<String>,
}

impl RunStatistics {
    /// Percentage of processed photos that contained wildlife.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        self.wildlife_found as f64 / self.total_processed.max(1) as f64 * 100.0
    }

    /// Count accepted detections of one photo.
    ///
    /// Labels differing only in case share a row, as they do in the allow-list.
    pub fn record_species<'a>(&mut self, species: impl IntoIterator<Item = &'a str>) {
        for animal in species {
            *self
                .animals_detected
                .entry(animal.trim().to_lowercase())
                .or_default() += 1;
        }
    }

    /// Summary view for printing.
    pub const fn summary(&self) -> RunSummary<'_> {
        RunSummary { stats: self }
    }
}

/// Human-readable report of a finished run.
#[derive(Debug)]
pub struct RunSummary<'a> {
    stats: &'a RunStatistics,
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;

        writeln!(f, "Processing complete")?;
        writeln!(f, "  Total images processed: {}", stats.total_processed)?;
        writeln!(f, "  Images with wildlife:   {}", stats.wildlife_found)?;
        writeln!(f, "  Images saved:           {}", stats.saved)?;
        writeln!(f, "  Success rate:           {:.1}%", stats.success_rate())?;

        if !stats.animals_detected.is_empty() {
            writeln!(f)?;
            writeln!(f, "Species detected:")?;
            for (animal, count) in &stats.animals_detected {
                writeln!(f, "  {animal}: {count}")?;
            }
        }

        if !stats.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors ({}):", stats.errors.len())?;
            for error in stats.errors.iter().take(MAX_SUMMARY_ERRORS) {
                writeln!(f, "  {error}")?;
            }
            let remaining = stats.errors.len().saturating_sub(MAX_SUMMARY_ERRORS);
            if remaining > 0 {
                writeln!(f, "  ... and {remaining} more")?;
            }
        }

        Ok(())
    }
}
