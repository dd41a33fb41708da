//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "trailsort";

/// Environment variable naming the config file, bypassing the platform directory.
pub const CONFIG_ENV: &str = "TRAILSORT_CONFIG";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default minimum confidence threshold for accepting a detection.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// Image extensions picked up from the input directory (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "bmp"];

/// Extension of the per-image sidecar record.
pub const SIDECAR_EXTENSION: &str = "json";

/// Suffix appended to a sidecar while it is being written.
pub const SIDECAR_TEMP_SUFFIX: &str = ".tmp";

/// Default wildlife classes (COCO vocabulary).
pub const DEFAULT_WILDLIFE_CLASSES: &[&str] = &[
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe",
];

/// Label added to the allow-list when people should be reported.
pub const PERSON_CLASS: &str = "person";

/// Maximum number of error messages shown in the run summary.
pub const MAX_SUMMARY_ERRORS: usize = 5;

/// File naming defaults.
pub mod naming {
    /// Timestamp format used as the filename prefix.
    pub const DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
    /// Separator between species names.
    pub const SEPARATOR: &str = "_";
    /// Token used when no wildlife was accepted.
    pub const NO_WILDLIFE_TOKEN: &str = "no_wildlife";
    /// Number of hex digits of the path hash used to disambiguate collisions.
    pub const HASH_SUFFIX_LEN: usize = 8;
    /// Characters that are replaced in species names before they reach a filename.
    pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
}

/// EXIF timestamp handling.
pub mod exif {
    /// Pattern of the EXIF `DateTime` tag.
    pub const DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Upper bound of percent-scaled confidences.
    pub const PERCENT_MAX: f32 = 100.0;
}

/// Bounding box disambiguation.
pub mod bbox {
    /// Width/height values at or above this are never read as a box size.
    pub const SIZE_CAP: f32 = 2000.0;
}

/// Local YOLO backend defaults.
pub mod yolo {
    /// Square model input size in pixels.
    pub const INPUT_SIZE: u32 = 640;
    /// Minimum class score for an anchor to become a candidate.
    pub const CANDIDATE_CONFIDENCE: f32 = 0.25;
    /// IoU above which overlapping boxes of the same class are suppressed.
    pub const IOU_THRESHOLD: f32 = 0.7;
    /// Maximum detections kept per image after NMS.
    pub const MAX_DETECTIONS: usize = 300;
    /// Number of box coordinates preceding class scores in each anchor.
    pub const BOX_FIELDS: usize = 4;
}

/// Remote backend defaults.
pub mod remote {
    /// Default hosted inference endpoint.
    pub const DEFAULT_ENDPOINT: &str = "https://detect.roboflow.com";
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Connection timeout in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Extra time granted to the outer guard beyond the request timeout.
    pub const TIMEOUT_GRACE_SECS: u64 = 5;
    /// Environment variable consulted for the API key.
    pub const API_KEY_ENV: &str = "TRAILSORT_API_KEY";
}
