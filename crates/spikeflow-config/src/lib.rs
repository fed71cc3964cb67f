// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikeflow Configuration
//!
//! Type-safe scenario loader: a whole network (populations, projections,
//! inputs, recording, logging) is described in one TOML file and checked
//! before anything is built. Validation collects every violation instead of
//! stopping at the first, so one failed load reports the full list.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spikeflow_config::load_scenario;
//!
//! let scenario = load_scenario(None).expect("failed to load scenario");
//! println!("dt = {} ms, seed = {}", scenario.simulation.dt, scenario.simulation.seed);
//! ```

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_environment_overrides, find_scenario_file, load_scenario};
pub use types::*;
pub use validation::{validate_scenario, ScenarioValidationError};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Scenario file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read scenario file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed:\n{0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
