//! CLI argument definitions.

use crate::cli::validators::{parse_confidence, parse_positive_count};
use crate::config::CollisionPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Detect wildlife in trail camera photos and organize them by date and species.
#[derive(Debug, Parser)]
#[command(name = "trailsort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory containing trail camera photos (default: paths.input_dir from config).
    #[arg(env = "TRAILSORT_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Options for organizing photos.
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run detection on a single photo and report what the batch would do with it.
    Inspect {
        /// Photo to analyze.
        image: PathBuf,
        /// Show every raw detection, not only accepted ones.
        #[arg(long)]
        all: bool,
        /// Backend name from configuration.
        #[arg(short, long, env = "TRAILSORT_BACKEND")]
        backend: Option<String>,
        /// Minimum confidence threshold (0.0-1.0).
        #[arg(short = 'c', long, value_parser = parse_confidence)]
        min_confidence: Option<f32>,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage detection backends.
    Backends {
        /// Backends action to perform.
        #[command(subcommand)]
        action: BackendsAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Backends subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum BackendsAction {
    /// List configured backends.
    List,
    /// Verify backend files and credentials.
    Check,
}

/// Arguments controlling a batch run.
#[derive(Debug, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Output directory for organized photos (default: paths.output_dir from config).
    #[arg(short, long, env = "TRAILSORT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Backend name from configuration.
    #[arg(short, long, env = "TRAILSORT_BACKEND")]
    pub backend: Option<String>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, value_parser = parse_confidence, env = "TRAILSORT_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Also save photos without wildlife.
    #[arg(long)]
    pub save_all: bool,

    /// Move photos instead of copying them.
    #[arg(long = "move")]
    pub move_files: bool,

    /// Do not write JSON sidecar records.
    #[arg(long)]
    pub no_sidecars: bool,

    /// How to handle two photos mapping to the same output name.
    #[arg(long, value_enum)]
    pub collision: Option<CollisionPolicy>,

    /// Maximum number of species listed in a filename.
    #[arg(long, value_parser = parse_positive_count)]
    pub max_species: Option<usize>,

    /// Species list file (one label per line) replacing the configured wildlife classes.
    #[arg(long, env = "TRAILSORT_SPECIES_LIST")]
    pub species_list: Option<PathBuf>,

    /// Suppress progress output and logs below warnings. The final summary still prints.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Request CUDA for local inference.
    #[arg(long, conflicts_with = "cpu")]
    pub gpu: bool,

    /// Force CPU inference.
    #[arg(long, conflicts_with = "gpu")]
    pub cpu: bool,
}
