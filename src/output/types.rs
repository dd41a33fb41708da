//! Persisted detection types.

use crate::inference::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A detection that passed the wildlife filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedDetection {
    /// Species label.
    pub animal: String,
    /// Detection confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Box `[x1, y1, x2, y2]` in source-image pixels.
    pub bbox: BoundingBox,
}

/// Sidecar record stored next to an organized photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path of the source photo.
    pub original_file: PathBuf,
    /// When the photo was processed.
    pub processed_date: DateTime<Utc>,
    /// Accepted detections, in backend order.
    pub detections: Vec<AcceptedDetection>,
}

impl ImageRecord {
    /// Create a record stamped with the current time.
    pub fn new(original_file: impl Into<PathBuf>, detections: Vec<AcceptedDetection>) -> Self {
        Self {
            original_file: original_file.into(),
            processed_date: Utc::now(),
            detections,
        }
    }
}
