//! Local YOLO detector backed by ONNX Runtime.
//!
//! Expects an Ultralytics-style export: one `[1, 3, S, S]` float input in
//! `0.0..=1.0` and one output of either `[1, 4 + classes, anchors]` or
//! `[1, anchors, 4 + classes]`, with boxes as center+size in input pixels.

use crate::config::{InferenceDevice, LocalBackendConfig};
use crate::constants::yolo::{BOX_FIELDS, MAX_DETECTIONS};
use crate::error::{Error, Result};
use crate::inference::Detector;
use crate::inference::types::{BoundingBox, RawDetection, Vocabulary};
use crate::utils::species_list::read_labels;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::Session;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};

/// Detector running a YOLO ONNX model in-process.
pub struct YoloDetector {
    name: String,
    session: Session,
    labels: Vec<String>,
    vocabulary: Vocabulary,
    input_size: u32,
    candidate_confidence: f32,
    iou_threshold: f32,
}

impl YoloDetector {
    /// Load the model and labels of a local backend.
    pub fn from_config(
        name: &str,
        config: &LocalBackendConfig,
        device: InferenceDevice,
    ) -> Result<Self> {
        let labels = read_labels(&config.labels)?;
        if labels.is_empty() {
            return Err(build_error(name, "labels file contains no labels"));
        }

        let session = Session::builder()
            .map_err(|e| build_error(name, e))?
            .with_execution_providers(execution_providers(device))
            .map_err(|e| build_error(name, e))?
            .commit_from_file(&config.path)
            .map_err(|e| build_error(name, e))?;

        info!(
            "Loaded model {} ({} classes, {}px input)",
            config.path.display(),
            labels.len(),
            config.input_size
        );

        Ok(Self {
            name: name.to_string(),
            session,
            vocabulary: labels.iter().cloned().collect(),
            labels,
            input_size: config.input_size,
            candidate_confidence: config.candidate_confidence,
            iou_threshold: config.iou_threshold,
        })
    }
}

impl Detector for YoloDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> Option<&Vocabulary> {
        Some(&self.vocabulary)
    }

    #[allow(clippy::cast_precision_loss)]
    fn detect(&mut self, image_path: &Path) -> Result<Vec<RawDetection>> {
        let img = image::open(image_path).map_err(|e| detection_error(image_path, e))?;
        let (orig_w, orig_h) = img.dimensions();

        let size = self.input_size as usize;
        let input = Tensor::from_array(([1usize, 3, size, size], preprocess(&img, self.input_size)))
            .map_err(|e| detection_error(image_path, e))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| detection_error(image_path, e))?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| detection_error(image_path, e))?;
        let dims = shape
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| detection_error(image_path, format!("invalid output shape {shape:?}")))?;

        let candidates = decode_output(&dims, data, self.labels.len(), self.candidate_confidence)
            .map_err(|reason| detection_error(image_path, reason))?;
        let candidate_count = candidates.len();
        let kept = non_max_suppression(candidates, self.iou_threshold, MAX_DETECTIONS);

        debug!(
            "{}: {} candidates, {} after NMS",
            image_path.display(),
            candidate_count,
            kept.len()
        );

        let sx = orig_w as f32 / self.input_size as f32;
        let sy = orig_h as f32 / self.input_size as f32;
        Ok(kept
            .into_iter()
            .map(|c| {
                RawDetection::new(
                    self.labels[c.class_id].clone(),
                    c.score,
                    c.bbox.scaled(sx, sy).clamped(orig_w, orig_h),
                )
            })
            .collect())
    }
}

/// A scored box in model input space, before suppression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    /// Index into the label list.
    pub class_id: usize,
    /// Best class score.
    pub score: f32,
    /// Box in corner form.
    pub bbox: BoundingBox,
}

fn execution_providers(device: InferenceDevice) -> Vec<ExecutionProviderDispatch> {
    match device {
        InferenceDevice::Cpu => {
            info!("Requested device: CPU");
            vec![CPUExecutionProvider::default().build()]
        }
        InferenceDevice::Auto => {
            debug!("Auto device: CUDA with CPU fallback");
            vec![
                CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ]
        }
        InferenceDevice::Gpu => {
            info!("Requested device: CUDA");
            vec![CUDAExecutionProvider::default().build().error_on_failure()]
        }
    }
}

/// Resize to the square model input and lay out as CHW floats in `0.0..=1.0`.
fn preprocess(img: &DynamicImage, input_size: u32) -> Vec<f32> {
    let resized = img
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8();
    let plane = (input_size as usize) * (input_size as usize);
    let mut data = vec![0.0_f32; plane * 3];

    for (i, pixel) in resized.pixels().enumerate() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            data[channel * plane + i] = f32::from(value) / 255.0;
        }
    }

    data
}

/// Decode raw model output into candidates scoring at least `min_score`.
///
/// Accepts both `[1, features, anchors]` and `[1, anchors, features]`.
pub(crate) fn decode_output(
    dims: &[usize],
    data: &[f32],
    num_classes: usize,
    min_score: f32,
) -> std::result::Result<Vec<Candidate>, String> {
    let features = BOX_FIELDS + num_classes;
    let (anchors, features_first) = match dims {
        [1, f, n] if *f == features => (*n, true),
        [1, n, f] if *f == features => (*n, false),
        _ => {
            return Err(format!(
                "unexpected output shape {dims:?} for {num_classes} classes"
            ));
        }
    };
    if data.len() != anchors * features {
        return Err(format!(
            "output has {} values, expected {}",
            data.len(),
            anchors * features
        ));
    }

    let value = |anchor: usize, field: usize| {
        if features_first {
            data[field * anchors + anchor]
        } else {
            data[anchor * features + field]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let best = (0..num_classes)
            .map(|class_id| (class_id, value(anchor, BOX_FIELDS + class_id)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((class_id, score)) = best
            && score >= min_score
        {
            candidates.push(Candidate {
                class_id,
                score,
                bbox: BoundingBox::from_center(
                    value(anchor, 0),
                    value(anchor, 1),
                    value(anchor, 2),
                    value(anchor, 3),
                ),
            });
        }
    }

    Ok(candidates)
}

/// Class-aware greedy non-max suppression.
///
/// Keeps the highest-scoring box of each overlapping same-class group,
/// returning at most `max_detections` boxes in descending score order.
pub(crate) fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

fn build_error(backend: &str, reason: impl Display) -> Error {
    Error::DetectorBuild {
        backend: backend.to_string(),
        reason: reason.to_string(),
    }
}

fn detection_error(path: &Path, reason: impl Display) -> Error {
    Error::Detection {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
