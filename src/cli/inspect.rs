//! Single-photo diagnostics.

use crate::config::{
    Config, get_backend, resolve_backend_name, validate_backend_config, validate_config,
};
use crate::error::{Error, Result};
use crate::inference::build_detector;
use crate::output::{NamingOptions, output_name, read_sidecar, sidecar_path_for};
use crate::pipeline::{build_allow_list, filter_detections};
use crate::utils::date::{read_exif_datetime, resolve_capture_time};
use crate::utils::species_list::read_species_list;
use std::path::Path;

/// Analyze one photo and print what a batch run would do with it.
///
/// Nothing is written to disk.
pub fn inspect_image(
    image: &Path,
    all: bool,
    backend: Option<&str>,
    min_confidence: Option<f32>,
    config: &Config,
) -> Result<()> {
    validate_config(config)?;
    if !image.is_file() {
        return Err(Error::ConfigValidation {
            message: format!("'{}' is not a file", image.display()),
        });
    }

    let backend_name = resolve_backend_name(backend, config)?;
    let backend_config = get_backend(config, &backend_name)?;
    validate_backend_config(&backend_name, backend_config)?;
    let min_confidence = min_confidence.unwrap_or(config.defaults.min_confidence);

    let format = image::ImageReader::open(image)?
        .with_guessed_format()?
        .format()
        .map_or_else(|| "unknown".to_string(), |f| format!("{f:?}"));
    let dimensions = image::image_dimensions(image)
        .map_or_else(|e| format!("unreadable ({e})"), |(w, h)| format!("{w}x{h}"));

    println!("File:        {}", image.display());
    println!("Format:      {format}");
    println!("Dimensions:  {dimensions}");
    match read_exif_datetime(image) {
        Some(taken) => println!("EXIF time:   {taken}"),
        None => println!("EXIF time:   not found"),
    }
    let capture = resolve_capture_time(image);
    println!("Capture time: {} ({:?})", capture.taken, capture.source);

    let mut detector = build_detector(&backend_name, backend_config, config.inference.device)?;
    let species_list = config
        .defaults
        .species_list_file
        .as_deref()
        .map(read_species_list)
        .transpose()?;
    let allow = build_allow_list(detector.vocabulary(), &config.wildlife, species_list);

    let raw = detector.detect(image)?;
    let accepted = filter_detections(&raw, min_confidence, &allow);

    println!();
    println!(
        "Backend:     {} ({} raw, {} accepted at >= {min_confidence:.2})",
        detector.name(),
        raw.len(),
        accepted.len()
    );
    if all {
        for detection in &raw {
            let accepted_marker = if accepted
                .iter()
                .any(|a| a.animal == detection.label && a.bbox == detection.bbox)
            {
                "*"
            } else {
                " "
            };
            let [x1, y1, x2, y2]: [f32; 4] = detection.bbox.into();
            println!(
                "  {accepted_marker} {:<16} {:.3}  [{x1:.0}, {y1:.0}, {x2:.0}, {y2:.0}]",
                detection.label, detection.confidence
            );
        }
    } else {
        for detection in &accepted {
            let [x1, y1, x2, y2]: [f32; 4] = detection.bbox.into();
            println!(
                "    {:<16} {:.3}  [{x1:.0}, {y1:.0}, {x2:.0}, {y2:.0}]",
                detection.animal, detection.confidence
            );
        }
    }

    let naming = NamingOptions::from(&config.naming);
    let name = output_name(image, capture.taken, &accepted, &naming);
    println!();
    println!("Output name: {name}");
    if accepted.is_empty() && !config.defaults.save_all_photos {
        println!("             (skipped: no wildlife and save_all_photos is off)");
    }

    if let Some(output_dir) = config.paths.output_dir.as_deref() {
        let sidecar = sidecar_path_for(&output_dir.join(&name));
        if sidecar.is_file() {
            match read_sidecar(&sidecar) {
                Ok(record) => println!(
                    "Existing:    {} ({} detections, processed {})",
                    sidecar.display(),
                    record.detections.len(),
                    record.processed_date.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                Err(e) => println!("Existing:    {} (unreadable: {e})", sidecar.display()),
            }
        }
    }

    Ok(())
}
