//! Error types for trailsort.

use std::path::PathBuf;

/// Result type alias for trailsort operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for trailsort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Input directory is missing or not a directory.
    #[error("input directory '{path}' does not exist or is not a directory")]
    InputDirNotFound {
        /// Configured input directory.
        path: PathBuf,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Detection backend not found in configuration.
    #[error("backend '{name}' not found in configuration")]
    BackendNotFound {
        /// Name of the missing backend.
        name: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: PathBuf,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Remote backend has no API key.
    #[error(
        "backend '{backend}' requires an API key (set api_key in config or TRAILSORT_API_KEY)"
    )]
    MissingApiKey {
        /// Name of the remote backend.
        backend: String,
    },

    /// Failed to build the detector.
    #[error("failed to build detector '{backend}': {reason}")]
    DetectorBuild {
        /// Backend name.
        backend: String,
        /// Description of the build failure.
        reason: String,
    },

    /// Failed to read species list file.
    #[error("failed to read species list file '{path}'")]
    SpeciesListRead {
        /// Path to the species list file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Detection backend failed or returned an unusable payload.
    #[error("detection failed for '{path}': {reason}")]
    Detection {
        /// Image that was being analyzed.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Failed to copy or move an image into the output directory.
    #[error("failed to transfer '{from}' to '{to}'")]
    ImageTransfer {
        /// Source image.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a sidecar record.
    #[error("failed to serialize sidecar record '{path}'")]
    SidecarSerialize {
        /// Sidecar path.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write a sidecar record.
    #[error("failed to write sidecar record '{path}'")]
    SidecarWrite {
        /// Sidecar path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or parse a sidecar record.
    #[error("failed to read sidecar record '{path}': {reason}")]
    SidecarRead {
        /// Sidecar path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Whether this error only concerns the image being processed.
    ///
    /// The batch orchestrator records these and moves on to the next image.
    /// Everything else aborts the run.
    pub const fn is_image_local(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Detection { .. }
                | Self::ImageTransfer { .. }
                | Self::SidecarSerialize { .. }
                | Self::SidecarWrite { .. }
        )
    }

    /// Message including every underlying cause, e.g.
    /// `failed to write sidecar record 'a.json': No space left on device`.
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }

    /// Whether this error is a pre-flight configuration problem.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigDirNotFound
                | Self::ConfigRead { .. }
                | Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::InputDirNotFound { .. }
                | Self::OutputDirCreateFailed { .. }
                | Self::BackendNotFound { .. }
                | Self::ModelFileNotFound { .. }
                | Self::LabelsFileNotFound { .. }
                | Self::LabelsRead { .. }
                | Self::MissingApiKey { .. }
                | Self::DetectorBuild { .. }
                | Self::SpeciesListRead { .. }
        )
    }
}
