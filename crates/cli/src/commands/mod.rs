pub mod config_cmd;
pub mod pricing;
pub mod report;
pub mod route;

use inferenceiq_config::{AppConfig, ConfigError};
use std::path::Path;

/// Load the config at `path`, or the default location when none is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}
