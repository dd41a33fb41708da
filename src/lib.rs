//! Trailsort - wildlife detection and organization for trail camera photos.
//!
//! This crate runs an object detector over a directory of photos, keeps the
//! detections that count as wildlife, and copies each photo into an output
//! directory under a `{date}_{species}` name next to a JSON sidecar record.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod utils;

use clap::Parser;
use cli::{BackendsAction, Cli, Command, ConfigAction, RunArgs};
use config::{
    BackendConfig, Config, RunSettings, config_file_path, get_backend, load_default_config,
    prepare_directories, resolve_run_settings, save_default_config, validate_backend_config,
    validate_config,
};
use inference::build_detector;
use output::progress;
use pipeline::{BatchOptions, BatchPhase, ImageOutcome, build_allow_list, collect_input_images};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use error::{Error, Result};

/// Main entry point for the trailsort CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.run.verbose, cli.run.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    organize_photos(cli.input_dir.as_deref(), &cli.run, &config)
}

/// Detect wildlife in every photo of the input directory and organize them.
fn organize_photos(input_dir: Option<&Path>, args: &RunArgs, config: &Config) -> Result<()> {
    let total_start = Instant::now();
    debug!("Batch phase: {}", BatchPhase::Idle);

    // Pre-flight: every check that can fail the run happens before the first photo
    validate_config(config)?;
    let settings = resolve_run_settings(input_dir, args, config)?;
    prepare_directories(&settings.input_dir, &settings.output_dir)?;

    let backend_config = get_backend(config, &settings.backend_name)?;
    validate_backend_config(&settings.backend_name, backend_config)?;

    let species_list = settings
        .species_list_file
        .as_deref()
        .map(|path| {
            info!("Loading species list: {}", path.display());
            utils::species_list::read_species_list(path)
        })
        .transpose()?;

    let mut detector = build_detector(&settings.backend_name, backend_config, settings.device)?;
    let allow = build_allow_list(detector.vocabulary(), &config.wildlife, species_list);
    match &allow {
        pipeline::AllowList::Any => info!("Backend has no fixed vocabulary, accepting every label"),
        pipeline::AllowList::Only(labels) => info!("Wildlife classes: {}", labels.len()),
    }

    debug!("Batch phase: {}", BatchPhase::Enumerating);
    let images = collect_input_images(&settings.input_dir)?;
    if images.is_empty() {
        warn!("No photos found in {}", settings.input_dir.display());
    } else {
        info!(
            "Found {} photo(s) in {}",
            images.len(),
            settings.input_dir.display()
        );
    }

    let options = batch_options(&settings, allow);
    let progress_enabled = !args.quiet && !args.no_progress;
    let image_progress = progress::create_image_progress(images.len(), progress_enabled);

    let stats = pipeline::run_batch(&images, detector.as_mut(), &options, |path, outcome| {
        if let ImageOutcome::Failed { reason } = outcome {
            debug!("{} failed: {reason}", path.display());
        }
        progress::set_progress_message(
            image_progress.as_ref(),
            &path.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned()),
        );
        progress::inc_progress(image_progress.as_ref());
    });

    let stats = match stats {
        Ok(stats) => {
            progress::finish_progress(image_progress, "Complete");
            stats
        }
        Err(e) => {
            progress::finish_progress(image_progress, "Failed");
            return Err(e);
        }
    };

    debug!("Batch phase: {}", BatchPhase::Summarizing);
    if !args.quiet {
        println!();
    }
    print!("{}", stats.summary());
    info!(
        "Complete: {} processed, {} saved, {} errors in {:.2}s",
        stats.total_processed,
        stats.saved,
        stats.errors.len(),
        total_start.elapsed().as_secs_f64()
    );
    debug!("Batch phase: {}", BatchPhase::Done);

    Ok(())
}

fn batch_options(settings: &RunSettings, allow: pipeline::AllowList) -> BatchOptions {
    BatchOptions {
        output_dir: settings.output_dir.clone(),
        min_confidence: settings.min_confidence,
        allow,
        save_all_photos: settings.save_all_photos,
        transfer: settings.transfer,
        write_sidecars: settings.write_sidecars,
        collision: settings.collision,
        naming: settings.naming.clone(),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default because CUDA fallback is expected in auto mode.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Inspect {
            image,
            all,
            backend,
            min_confidence,
        } => cli::inspect::inspect_image(&image, all, backend.as_deref(), min_confidence, config),
        Command::Config { action } => handle_config_command(action, config),
        Command::Backends { action } => handle_backends_command(action, config),
    }
}

fn handle_config_command(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default())?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps: add a backend, for example");
                println!();
                println!("  [backends.yolov8n]");
                println!("  type = \"local\"");
                println!("  path = \"/models/yolov8n.onnx\"");
                println!("  labels = \"/models/coco.names\"");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let shown = toml::to_string_pretty(&redacted(config))
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{shown}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Copy of the config with API keys masked.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    for backend in config.backends.values_mut() {
        if let BackendConfig::Remote(remote) = backend
            && remote.api_key.is_some()
        {
            remote.api_key = Some("********".to_string());
        }
    }
    config
}

fn handle_backends_command(action: BackendsAction, config: &Config) -> Result<()> {
    match action {
        BackendsAction::List => {
            if config.backends.is_empty() {
                println!("No backends configured.");
            } else {
                println!("Configured backends:");
                for (name, backend) in &config.backends {
                    let default_marker = config.defaults.backend.as_ref().is_some_and(|d| d == name);
                    let target = match backend {
                        BackendConfig::Local(local) => local.path.display().to_string(),
                        BackendConfig::Remote(remote) => {
                            format!("{}/{}", remote.endpoint, remote.model_id)
                        }
                    };
                    println!(
                        "  {} ({}) {}{}",
                        name,
                        backend.kind(),
                        target,
                        if default_marker { " [default]" } else { "" }
                    );
                }
            }
            Ok(())
        }
        BackendsAction::Check => {
            let mut failures = 0;
            for (name, backend) in &config.backends {
                match validate_backend_config(name, backend) {
                    Ok(()) => println!("  {name}: OK"),
                    Err(e) => {
                        println!("  {name}: {}", e.detailed_message());
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Err(Error::ConfigValidation {
                    message: format!("{failures} backend(s) failed validation"),
                });
            }
            Ok(())
        }
    }
}
