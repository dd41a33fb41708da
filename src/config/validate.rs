//! Configuration validation.
//!
//! Everything here runs before the first image is touched; any failure is
//! fatal for the run.

use crate::config::{BackendConfig, Config};
use crate::constants::{confidence, remote};
use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use std::path::Path;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_naming(config)?;
    Ok(())
}

/// Validate default settings.
fn validate_defaults(config: &Config) -> Result<()> {
    let defaults = &config.defaults;

    validate_confidence(defaults.min_confidence)?;

    if let Some(ref backend) = defaults.backend
        && !config.backends.contains_key(backend)
    {
        return Err(Error::BackendNotFound {
            name: backend.clone(),
        });
    }

    Ok(())
}

/// Validate a confidence threshold.
pub(crate) fn validate_confidence(value: f32) -> Result<()> {
    if !(confidence::MIN..=confidence::MAX).contains(&value) {
        return Err(Error::ConfigValidation {
            message: format!(
                "min_confidence must be between {} and {}, got {}",
                confidence::MIN,
                confidence::MAX,
                value
            ),
        });
    }
    Ok(())
}

/// Validate naming settings.
fn validate_naming(config: &Config) -> Result<()> {
    let naming = &config.naming;

    if naming.date_format.is_empty() {
        return Err(Error::ConfigValidation {
            message: "naming.date_format must not be empty".to_string(),
        });
    }

    if StrftimeItems::new(&naming.date_format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::ConfigValidation {
            message: format!("naming.date_format is invalid: '{}'", naming.date_format),
        });
    }

    for (field, value) in [
        ("naming.date_format", naming.date_format.as_str()),
        ("naming.separator", naming.separator.as_str()),
        ("naming.no_wildlife_token", naming.no_wildlife_token.as_str()),
    ] {
        if value.contains(['/', '\\']) {
            return Err(Error::ConfigValidation {
                message: format!("{field} must not contain path separators"),
            });
        }
    }

    if naming.no_wildlife_token.is_empty() {
        return Err(Error::ConfigValidation {
            message: "naming.no_wildlife_token must not be empty".to_string(),
        });
    }

    if naming.max_species == Some(0) {
        return Err(Error::ConfigValidation {
            message: "naming.max_species must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Validate a backend configuration and check its files and credentials.
pub fn validate_backend_config(name: &str, backend: &BackendConfig) -> Result<()> {
    match backend {
        BackendConfig::Local(local) => {
            if !local.path.exists() {
                return Err(Error::ModelFileNotFound {
                    path: local.path.clone(),
                });
            }
            if !local.labels.exists() {
                return Err(Error::LabelsFileNotFound {
                    path: local.labels.clone(),
                });
            }
            if local.input_size == 0 {
                return Err(Error::ConfigValidation {
                    message: format!("backend '{name}': input_size must be positive"),
                });
            }
            for (field, value) in [
                ("candidate_confidence", local.candidate_confidence),
                ("iou_threshold", local.iou_threshold),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(Error::ConfigValidation {
                        message: format!(
                            "backend '{name}': {field} must be between 0.0 and 1.0, got {value}"
                        ),
                    });
                }
            }
        }
        BackendConfig::Remote(remote_cfg) => {
            if remote_cfg.model_id.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("backend '{name}': model_id must not be empty"),
                });
            }
            if remote_cfg.timeout_secs == 0 {
                return Err(Error::ConfigValidation {
                    message: format!("backend '{name}': timeout_secs must be positive"),
                });
            }
            reqwest::Url::parse(&remote_cfg.endpoint).map_err(|e| Error::ConfigValidation {
                message: format!(
                    "backend '{name}': invalid endpoint '{}': {e}",
                    remote_cfg.endpoint
                ),
            })?;
            if resolve_api_key(remote_cfg.api_key.as_deref()).is_none() {
                return Err(Error::MissingApiKey {
                    backend: name.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Resolve the API key from config, falling back to the environment.
pub(crate) fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(remote::API_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Get a backend by name from the config.
pub fn get_backend<'a>(config: &'a Config, name: &str) -> Result<&'a BackendConfig> {
    config.backends.get(name).ok_or_else(|| Error::BackendNotFound {
        name: name.to_string(),
    })
}

/// Check the input directory and create the output directory.
pub fn prepare_directories(input_dir: &Path, output_dir: &Path) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(Error::InputDirNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    std::fs::create_dir_all(output_dir).map_err(|e| Error::OutputDirCreateFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let same_dir = match (input_dir.canonicalize(), output_dir.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    };
    if same_dir {
        return Err(Error::ConfigValidation {
            message: format!(
                "output directory must differ from input directory '{}'",
                input_dir.display()
            ),
        });
    }

    Ok(())
}
