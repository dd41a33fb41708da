//! Configuration loading and management.

mod file;
mod paths;
mod settings;
mod types;
mod validate;

pub use file::{load_config_file, load_default_config, save_config, save_default_config};
pub use paths::config_file_path;
pub use settings::{RunSettings, resolve_run_settings};
pub use types::{
    BackendConfig, BoxFormat, CollisionPolicy, ConfidenceScale, Config, DefaultsConfig,
    InferenceConfig, InferenceDevice, LocalBackendConfig, NamingConfig, PathsConfig,
    RemoteBackendConfig, TransferMode, WildlifeConfig,
};
pub use validate::{get_backend, prepare_directories, validate_backend_config, validate_config};
pub(crate) use settings::resolve_backend_name;
pub(crate) use validate::resolve_api_key;
