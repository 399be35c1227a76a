//! Configuration presets.
//!
//! The presets span the range the original dashboards exposed through their
//! "number of simulations" slider (100..=5000, default 1000), each with a
//! twelve-week horizon.

use crate::forecast::{ForecastConfig, SimulationSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// 100 trials: fast, visibly noisy curves
    Quick,
    /// 1000 trials: the default
    Standard,
    /// 5000 trials: smooth curves for reporting
    Thorough,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Quick, PresetName::Standard, PresetName::Thorough];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Quick => "quick",
            PresetName::Standard => "standard",
            PresetName::Thorough => "thorough",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "quick" | "fast" => Some(PresetName::Quick),
            "standard" | "default" => Some(PresetName::Standard),
            "thorough" | "slow" | "report" => Some(PresetName::Thorough),
            _ => None,
        }
    }

    fn num_simulations(&self) -> usize {
        match self {
            PresetName::Quick => 100,
            PresetName::Standard => 1000,
            PresetName::Thorough => 5000,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            PresetName::Quick => "100 trials; fast, noisy weekly curves",
            PresetName::Standard => "1000 trials; balanced default",
            PresetName::Thorough => "5000 trials; smooth curves for reporting",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing entry for `config presets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: PresetName,
    pub description: String,
    pub num_simulations: usize,
    pub num_weeks_future: usize,
}

/// Build the full configuration for a preset.
pub fn get_preset(name: PresetName) -> ForecastConfig {
    ForecastConfig {
        description: Some(format!("preset: {}", name)),
        simulation: SimulationSettings {
            num_simulations: name.num_simulations(),
            ..SimulationSettings::default()
        },
        ..ForecastConfig::default()
    }
}

/// Describe every preset.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|name| {
            let config = get_preset(*name);
            PresetInfo {
                name: *name,
                description: name.description().to_string(),
                num_simulations: config.simulation.num_simulations,
                num_weeks_future: config.simulation.num_weeks_future,
            }
        })
        .collect()
}
