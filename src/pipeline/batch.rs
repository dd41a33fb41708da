//! Per-image processing and the batch loop.
//!
//! A batch is a fold of [`process_image`] over the input photos: each step
//! takes the current [`BatchState`] and returns it updated together with the
//! photo's [`ImageOutcome`]. Image-local failures are recorded in the
//! statistics; anything else ends the run.

use crate::config::{CollisionPolicy, TransferMode};
use crate::error::{Error, Result};
use crate::inference::Detector;
use crate::output::{
    AcceptedDetection, ImageRecord, NamingOptions, disambiguate, output_name, sidecar_path_for,
    transfer_image, write_sidecar,
};
use crate::pipeline::filter::{AllowList, filter_detections};
use crate::pipeline::stats::RunStatistics;
use crate::utils::date::resolve_capture_time;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stage of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Not started.
    Idle,
    /// Listing input photos.
    Enumerating,
    /// Working on photo `index` (0-based) of `total`.
    Processing {
        /// Current photo.
        index: usize,
        /// Number of photos in the run.
        total: usize,
    },
    /// Building the summary.
    Summarizing,
    /// Finished.
    Done,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Enumerating => write!(f, "enumerating"),
            Self::Processing { index, total } => write!(f, "processing {}/{total}", index + 1),
            Self::Summarizing => write!(f, "summarizing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Settings shared by every photo of a run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving organized photos.
    pub output_dir: PathBuf,
    /// Minimum accepted confidence.
    pub min_confidence: f32,
    /// Labels counted as wildlife.
    pub allow: AllowList,
    /// Save photos without wildlife too.
    pub save_all_photos: bool,
    /// Copy or move.
    pub transfer: TransferMode,
    /// Write sidecar records.
    pub write_sidecars: bool,
    /// Collision handling.
    pub collision: CollisionPolicy,
    /// Output naming options.
    pub naming: NamingOptions,
}

/// Accumulator threaded through the batch.
#[derive(Debug, Clone, Default)]
pub struct BatchState {
    /// Statistics so far.
    pub stats: RunStatistics,
    claimed_stems: HashSet<String>,
}

impl BatchState {
    fn record_error(&mut self, path: &Path, err: &Error) {
        let message = format!("{}: {}", display_name(path), err.detailed_message());
        warn!("{message}");
        self.stats.errors.push(message);
    }

    /// Reserve an output name, disambiguating it if the policy asks for that.
    ///
    /// Names are claimed by stem: `x.jpg` and `x.png` share the sidecar
    /// `x.json`, so the second one counts as a collision.
    fn claim_name(&mut self, name: String, original: &Path, policy: CollisionPolicy) -> String {
        let name = match policy {
            CollisionPolicy::Hash if self.claimed_stems.contains(name_stem(&name)) => {
                let unique = disambiguate(&name, original);
                debug!("Output name {name} already used, writing {unique}");
                unique
            }
            CollisionPolicy::Hash | CollisionPolicy::Overwrite => name,
        };
        self.claimed_stems.insert(name_stem(&name).to_string());
        name
    }
}

fn name_stem(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Photo written to the output directory.
    Saved {
        /// Output photo path.
        output: PathBuf,
        /// Sidecar path, when one was written.
        sidecar: Option<PathBuf>,
        /// Whether any wildlife was accepted.
        wildlife: bool,
    },
    /// No wildlife and save-all disabled; nothing written.
    Skipped,
    /// An image-local error stopped the photo from being saved.
    Failed {
        /// Error message.
        reason: String,
    },
}

/// Process one photo: resolve its time, detect, filter, name, and write.
///
/// Detection errors are recorded and the photo is treated as having no
/// detections. Errors that are not image-local are returned.
pub fn process_image(
    path: &Path,
    detector: &mut dyn Detector,
    options: &BatchOptions,
    mut state: BatchState,
) -> Result<(ImageOutcome, BatchState)> {
    state.stats.total_processed += 1;

    let capture = resolve_capture_time(path);
    debug!(
        "{}: taken {} ({:?})",
        display_name(path),
        capture.taken,
        capture.source
    );

    let (raw, detection_failure) = match detector.detect(path) {
        Ok(raw) => (raw, None),
        Err(e) if e.is_image_local() => {
            state.record_error(path, &e);
            (Vec::new(), Some(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    let accepted = filter_detections(&raw, options.min_confidence, &options.allow);
    let wildlife = !accepted.is_empty();
    debug!(
        "{}: {} raw detections, {} accepted",
        display_name(path),
        raw.len(),
        accepted.len()
    );

    if wildlife {
        state.stats.wildlife_found += 1;
        state
            .stats
            .record_species(accepted.iter().map(|d| d.animal.as_str()));
    } else if !options.save_all_photos {
        state.stats.skipped += 1;
        let outcome = detection_failure.map_or(ImageOutcome::Skipped, |reason| {
            ImageOutcome::Failed { reason }
        });
        return Ok((outcome, state));
    }

    let name = output_name(path, capture.taken, &accepted, &options.naming);
    let name = state.claim_name(name, path, options.collision);
    let output = options.output_dir.join(&name);

    match write_outputs(path, &output, &accepted, options) {
        Ok(sidecar) => {
            state.stats.saved += 1;
            info!("{} -> {name}", display_name(path));
            Ok((
                ImageOutcome::Saved {
                    output,
                    sidecar,
                    wildlife,
                },
                state,
            ))
        }
        Err(e) if e.is_image_local() => {
            state.record_error(path, &e);
            Ok((
                ImageOutcome::Failed {
                    reason: e.detailed_message(),
                },
                state,
            ))
        }
        Err(e) => Err(e),
    }
}

/// Copy or move the photo, then write its sidecar if anything was accepted.
fn write_outputs(
    source: &Path,
    output: &Path,
    accepted: &[AcceptedDetection],
    options: &BatchOptions,
) -> Result<Option<PathBuf>> {
    transfer_image(source, output, options.transfer)?;

    if accepted.is_empty() || !options.write_sidecars {
        return Ok(None);
    }

    let sidecar = sidecar_path_for(output);
    write_sidecar(&sidecar, &ImageRecord::new(source, accepted.to_vec()))?;
    Ok(Some(sidecar))
}

/// Run every photo through [`process_image`], calling `on_image` after each.
pub fn run_batch<F>(
    images: &[PathBuf],
    detector: &mut dyn Detector,
    options: &BatchOptions,
    mut on_image: F,
) -> Result<RunStatistics>
where
    F: FnMut(&Path, &ImageOutcome),
{
    let total = images.len();
    let mut state = BatchState::default();

    for (index, path) in images.iter().enumerate() {
        debug!("Batch phase: {}", BatchPhase::Processing { index, total });
        let (outcome, next) = process_image(path, detector, options, state)?;
        on_image(path, &outcome);
        state = next;
    }

    Ok(state.stats)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
