//! Normalization of backend output into the canonical detection shape.
//!
//! Backends disagree on two things: the scale of confidences (0-1 or 0-100)
//! and the box encoding (corners or center+size). Both are resolved here so
//! nothing downstream needs to know which backend produced a detection.

use crate::config::{BoxFormat, ConfidenceScale};
use crate::constants::{bbox::SIZE_CAP, confidence};
use crate::inference::types::BoundingBox;

/// Bring a confidence value into `0.0..=1.0`.
///
/// Returns an error description for values that fit no scale (negative, NaN,
/// above 100, or above 1 when the backend declared a unit scale).
pub fn normalize_confidence(value: f32, scale: ConfidenceScale) -> Result<f32, String> {
    if !value.is_finite() || value < confidence::MIN {
        return Err(format!("invalid confidence value {value}"));
    }

    match scale {
        ConfidenceScale::Unit if value <= confidence::MAX => Ok(value),
        ConfidenceScale::Unit => Err(format!(
            "confidence {value} exceeds 1.0 on a unit-scaled backend"
        )),
        ConfidenceScale::Percent | ConfidenceScale::Auto if value <= confidence::PERCENT_MAX => {
            if scale == ConfidenceScale::Percent || value > confidence::MAX {
                Ok(value / confidence::PERCENT_MAX)
            } else {
                Ok(value)
            }
        }
        ConfidenceScale::Percent | ConfidenceScale::Auto => {
            Err(format!("confidence {value} exceeds 100"))
        }
    }
}

/// Decide whether four ambiguous box values are corners or center+size.
///
/// The values are read as center+size only when the size is smaller than the
/// image and the absolute cap, and the implied box lies inside the image.
/// Anything else is taken as corner form.
#[allow(clippy::cast_precision_loss)]
pub fn infer_box_format(values: [f32; 4], image_width: u32, image_height: u32) -> BoxFormat {
    let [cx, cy, w, h] = values;
    let (img_w, img_h) = (image_width as f32, image_height as f32);

    let size_plausible = w < img_w && h < img_h && w < SIZE_CAP && h < SIZE_CAP;
    if !size_plausible {
        return BoxFormat::Corners;
    }

    let candidate = BoundingBox::from_center(cx, cy, w, h);
    let inside = candidate.x1 >= 0.0
        && candidate.y1 >= 0.0
        && candidate.x2 <= img_w
        && candidate.y2 <= img_h;

    if inside {
        BoxFormat::Center
    } else {
        BoxFormat::Corners
    }
}

/// Convert four box values in the declared format into corner form.
pub fn normalize_box(
    values: [f32; 4],
    format: BoxFormat,
    image_width: u32,
    image_height: u32,
) -> BoundingBox {
    let resolved = match format {
        BoxFormat::Auto => infer_box_format(values, image_width, image_height),
        declared => declared,
    };

    let [a, b, c, d] = values;
    match resolved {
        BoxFormat::Center => BoundingBox::from_center(a, b, c, d),
        BoxFormat::Corners | BoxFormat::Auto => BoundingBox::new(a, b, c, d),
    }
}
