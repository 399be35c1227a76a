//! Backlog Forecast configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for forecast.json
//! - Built-in presets mirroring the interactive slider ranges
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod forecast;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use forecast::{
    EstimationSettings, ForecastConfig, GroupBy, OutputSettings, SimulationSettings,
    TotalRounding,
};
pub use preset::{get_preset, list_presets, PresetInfo, PresetName};
pub use resolve::{load_config, resolve_config_path, ConfigError, ConfigSource, ResolvedConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
