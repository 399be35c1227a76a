//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → `BF_CONFIG` → `BF_CONFIG_DIR` → XDG → defaults.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::forecast::ForecastConfig;
use crate::validate::{validate_config, ValidationError};

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--config`.
    CliArgument,

    /// `BF_CONFIG` or `BF_CONFIG_DIR`.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// No file; built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

pub const ENV_CONFIG_PATH: &str = "BF_CONFIG";
pub const ENV_CONFIG_DIR: &str = "BF_CONFIG_DIR";

const CONFIG_FILENAME: &str = "forecast.json";
const APP_NAME: &str = "backlog-forecast";

/// Errors from locating or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound(_) => 60,
            ConfigError::Validation(e) => e.code(),
        }
    }
}

/// A loaded, validated configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ForecastConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Locate the configuration file.
///
/// An explicit CLI path is returned even when it does not exist so the
/// caller can report it; every other source is skipped when missing.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// XDG config directory for backlog-forecast.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Resolve, parse and validate the configuration.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config_path(cli_path);

    let config = match &path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.clone()));
            }
            ForecastConfig::from_file(p)?
        }
        None => ForecastConfig::default(),
    };

    validate_config(&config)?;

    debug!(
        source = %source,
        path = ?path,
        num_simulations = config.simulation.num_simulations,
        num_weeks_future = config.simulation.num_weeks_future,
        "configuration loaded"
    );

    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn explicit_missing_path_is_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/forecast.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert_eq!(err.code(), 60);
    }
}
