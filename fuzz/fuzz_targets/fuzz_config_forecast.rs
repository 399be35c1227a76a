//! Fuzz target for forecast.json configuration parsing.
//!
//! Parsing and validation should never panic, only return an error.

#![no_main]

use bf_config::{validate_config, ForecastConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<ForecastConfig>(data) {
        let _ = validate_config(&config);
    }
});
