//! Configuration type definitions.

use crate::constants::{
    DEFAULT_MIN_CONFIDENCE, DEFAULT_WILDLIFE_CLASSES, naming, remote, yolo,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default input/output directories.
    pub paths: PathsConfig,

    /// Default run settings.
    pub defaults: DefaultsConfig,

    /// Wildlife allow-list settings.
    pub wildlife: WildlifeConfig,

    /// Output naming settings.
    pub naming: NamingConfig,

    /// Inference settings.
    pub inference: InferenceConfig,

    /// Configured detection backends by name.
    pub backends: BTreeMap<String, BackendConfig>,
}

/// Default directories used when none are given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory containing trail camera photos.
    pub input_dir: Option<PathBuf>,
    /// Directory receiving organized photos.
    pub output_dir: Option<PathBuf>,
}

/// Default run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Backend name to use.
    pub backend: Option<String>,

    /// Minimum confidence threshold.
    pub min_confidence: f32,

    /// Save photos without wildlife too.
    pub save_all_photos: bool,

    /// Copy or move source photos.
    pub transfer: TransferMode,

    /// Write JSON sidecar records.
    pub write_sidecars: bool,

    /// How to handle two photos mapping to the same name.
    pub collision: CollisionPolicy,

    /// Species list file overriding `wildlife.classes`.
    pub species_list_file: Option<PathBuf>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            backend: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            save_all_photos: false,
            transfer: TransferMode::Copy,
            write_sidecars: true,
            collision: CollisionPolicy::Hash,
            species_list_file: None,
        }
    }
}

/// Wildlife allow-list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WildlifeConfig {
    /// Labels treated as wildlife.
    pub classes: Vec<String>,
    /// Also accept `person` detections.
    pub include_people: bool,
}

impl Default for WildlifeConfig {
    fn default() -> Self {
        Self {
            classes: DEFAULT_WILDLIFE_CLASSES
                .iter()
                .map(ToString::to_string)
                .collect(),
            include_people: true,
        }
    }
}

/// Output file naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// `chrono` format for the timestamp prefix.
    pub date_format: String,
    /// Separator between species names.
    pub separator: String,
    /// Token used when nothing was accepted.
    pub no_wildlife_token: String,
    /// Maximum species listed in a name.
    pub max_species: Option<usize>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            date_format: naming::DATE_FORMAT.to_string(),
            separator: naming::SEPARATOR.to_string(),
            no_wildlife_token: naming::NO_WILDLIFE_TOKEN.to_string(),
            max_species: None,
        }
    }
}

/// Inference device configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InferenceDevice {
    /// Automatically select (GPU if available, else CPU).
    #[default]
    Auto,
    /// Request CUDA, fail if it cannot be registered.
    Gpu,
    /// Force CPU inference.
    Cpu,
}

/// Inference settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device to use for local inference.
    pub device: InferenceDevice,
}

/// How source photos reach the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Copy, leaving the source untouched.
    #[default]
    Copy,
    /// Move the source into the output directory.
    Move,
}

/// Handling of output name collisions within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append a short hash of the source path to later duplicates.
    #[default]
    Hash,
    /// Let the later photo overwrite the earlier one.
    Overwrite,
}

/// A configured detection backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Local ONNX model.
    Local(LocalBackendConfig),
    /// Hosted HTTP model.
    Remote(RemoteBackendConfig),
}

impl BackendConfig {
    /// Short backend kind for display.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Remote(_) => "remote",
        }
    }
}

/// Local YOLO-style ONNX model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBackendConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,
    /// Path to the labels file (one class per line, in model order).
    pub labels: PathBuf,
    /// Square input size of the model.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Minimum class score for a candidate box.
    #[serde(default = "default_candidate_confidence")]
    pub candidate_confidence: f32,
    /// IoU threshold for non-max suppression.
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
}

/// Hosted model reached over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteBackendConfig {
    /// Base URL of the inference service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier, e.g. `project/version`.
    pub model_id: String,
    /// API key (falls back to `TRAILSORT_API_KEY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bounding box convention of the responses.
    #[serde(default = "default_remote_box_format")]
    pub bbox_format: BoxFormat,
    /// Confidence scale of the responses.
    #[serde(default)]
    pub confidence_scale: ConfidenceScale,
}

/// Bounding box convention declared by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxFormat {
    /// Infer per box from image dimensions.
    #[default]
    Auto,
    /// `[x1, y1, x2, y2]`.
    Corners,
    /// `[center_x, center_y, width, height]`.
    Center,
}

/// Confidence scale declared by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceScale {
    /// Values above 1 are read as percentages.
    #[default]
    Auto,
    /// Values are in 0..=1.
    Unit,
    /// Values are in 0..=100.
    Percent,
}

const fn default_input_size() -> u32 {
    yolo::INPUT_SIZE
}

const fn default_candidate_confidence() -> f32 {
    yolo::CANDIDATE_CONFIDENCE
}

const fn default_iou_threshold() -> f32 {
    yolo::IOU_THRESHOLD
}

fn default_endpoint() -> String {
    remote::DEFAULT_ENDPOINT.to_string()
}

const fn default_timeout_secs() -> u64 {
    remote::DEFAULT_TIMEOUT_SECS
}

const fn default_remote_box_format() -> BoxFormat {
    BoxFormat::Center
}
