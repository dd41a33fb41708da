//! Object detection backends.
//!
//! Every backend implements [`Detector`] and produces [`RawDetection`]s with
//! confidences in `0.0..=1.0` and boxes in corner form, whatever its native
//! output looks like.

mod normalize;
mod remote;
mod types;
mod yolo;

pub use normalize::{infer_box_format, normalize_box, normalize_confidence};
pub use remote::RemoteDetector;
pub use types::{BoundingBox, RawDetection, Vocabulary};
pub use yolo::YoloDetector;

use crate::config::{BackendConfig, InferenceDevice};
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// A detection backend.
pub trait Detector {
    /// Configured backend name.
    fn name(&self) -> &str;

    /// Labels this backend can produce, when known up front.
    ///
    /// Hosted models do not publish their label set, so they return `None`
    /// and the wildlife allow-list is not applied to them.
    fn vocabulary(&self) -> Option<&Vocabulary>;

    /// Run detection on one image.
    ///
    /// Returns [`crate::Error::Detection`] when the image cannot be decoded or
    /// the backend fails or returns a malformed payload.
    fn detect(&mut self, image_path: &Path) -> Result<Vec<RawDetection>>;
}

/// Build the detector for a configured backend.
pub fn build_detector(
    name: &str,
    config: &BackendConfig,
    device: InferenceDevice,
) -> Result<Box<dyn Detector>> {
    info!("Loading {} backend '{}'", config.kind(), name);
    match config {
        BackendConfig::Local(local) => Ok(Box::new(YoloDetector::from_config(name, local, device)?)),
        BackendConfig::Remote(remote) => Ok(Box::new(RemoteDetector::from_config(name, remote)?)),
    }
}
