//! Run settings resolution.
//!
//! Merges CLI arguments (and their environment variables) over the config
//! file into the flat settings a batch run needs.

use crate::cli::RunArgs;
use crate::config::types::{CollisionPolicy, Config, InferenceDevice, TransferMode};
use crate::config::validate::validate_confidence;
use crate::error::{Error, Result};
use crate::output::NamingOptions;
use std::path::{Path, PathBuf};

/// Effective settings for one batch run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directory containing source photos.
    pub input_dir: PathBuf,
    /// Directory receiving organized photos.
    pub output_dir: PathBuf,
    /// Name of the backend to use.
    pub backend_name: String,
    /// Minimum accepted confidence.
    pub min_confidence: f32,
    /// Save photos without wildlife too.
    pub save_all_photos: bool,
    /// Copy or move.
    pub transfer: TransferMode,
    /// Write sidecar records.
    pub write_sidecars: bool,
    /// Collision handling.
    pub collision: CollisionPolicy,
    /// Optional species list replacing `wildlife.classes`.
    pub species_list_file: Option<PathBuf>,
    /// Output naming options.
    pub naming: NamingOptions,
    /// Inference device for local backends.
    pub device: InferenceDevice,
}

/// Resolve settings for a batch run.
///
/// Priority: CLI flag (or its environment variable) > config file > built-in default.
pub fn resolve_run_settings(
    input_dir: Option<&Path>,
    args: &RunArgs,
    config: &Config,
) -> Result<RunSettings> {
    let input_dir = input_dir
        .map(Path::to_path_buf)
        .or_else(|| config.paths.input_dir.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no input directory specified (pass INPUT_DIR or set paths.input_dir in config)"
                .to_string(),
        })?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| config.paths.output_dir.clone())
        .ok_or_else(|| Error::ConfigValidation {
            message: "no output directory specified (use -o or set paths.output_dir in config)"
                .to_string(),
        })?;

    let backend_name = resolve_backend_name(args.backend.as_deref(), config)?;

    let min_confidence = args
        .min_confidence
        .unwrap_or(config.defaults.min_confidence);
    validate_confidence(min_confidence)?;

    let transfer = if args.move_files {
        TransferMode::Move
    } else {
        config.defaults.transfer
    };

    let device = if args.gpu {
        InferenceDevice::Gpu
    } else if args.cpu {
        InferenceDevice::Cpu
    } else {
        config.inference.device
    };

    let mut naming = NamingOptions::from(&config.naming);
    if let Some(max) = args.max_species {
        naming.max_species = Some(max);
    }

    Ok(RunSettings {
        input_dir,
        output_dir,
        backend_name,
        min_confidence,
        save_all_photos: args.save_all || config.defaults.save_all_photos,
        transfer,
        write_sidecars: !args.no_sidecars && config.defaults.write_sidecars,
        collision: args.collision.unwrap_or(config.defaults.collision),
        species_list_file: args
            .species_list
            .clone()
            .or_else(|| config.defaults.species_list_file.clone()),
        naming,
        device,
    })
}

/// Pick the backend: explicit name, then `defaults.backend`, then the only configured one.
pub(crate) fn resolve_backend_name(explicit: Option<&str>, config: &Config) -> Result<String> {
    if let Some(name) = explicit.or(config.defaults.backend.as_deref()) {
        return Ok(name.to_string());
    }

    let mut names = config.backends.keys();
    match (names.next(), names.next()) {
        (Some(only), None) => Ok(only.clone()),
        _ => Err(Error::ConfigValidation {
            message: "no backend specified (use -b or set defaults.backend in config)".to_string(),
        }),
    }
}
