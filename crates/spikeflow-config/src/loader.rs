// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario file loading with override support
//!
//! Loading happens in three tiers:
//! 1. TOML file (base scenario)
//! 2. Environment variables (runtime overrides)
//! 3. Validation (collect-all, before anything is built)

use crate::validation::validate_scenario;
use crate::{ConfigError, ConfigResult, Scenario};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const SCENARIO_FILE_NAME: &str = "spikeflow.toml";

/// Find the scenario file
///
/// Search order:
/// 1. `SPIKEFLOW_SCENARIO_PATH` environment variable
/// 2. Current working directory: `./spikeflow.toml`
/// 3. Ancestor directories (up to 5 levels, for workspace-root scenarios)
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no scenario file is found
pub fn find_scenario_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SPIKEFLOW_SCENARIO_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Scenario file specified by SPIKEFLOW_SCENARIO_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(SCENARIO_FILE_NAME));
        let mut current = cwd;
        for _ in 0..5 {
            let Some(parent) = current.parent() else {
                break;
            };
            search_paths.push(parent.join(SCENARIO_FILE_NAME));
            current = parent.to_path_buf();
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "Scenario file '{}' not found in any of these locations:\n{}\n\nSet SPIKEFLOW_SCENARIO_PATH to specify a custom location.",
        SCENARIO_FILE_NAME, search_list
    )))
}

/// Load, override, and validate a scenario
///
/// # Arguments
///
/// * `path` - Optional scenario path. If `None`, searches for the file.
///
/// # Errors
///
/// Returns an error if the file is missing, contains invalid TOML, or fails
/// validation
pub fn load_scenario(path: Option<&Path>) -> ConfigResult<Scenario> {
    let scenario_file = if let Some(path) = path {
        path.to_path_buf()
    } else {
        find_scenario_file()?
    };

    let content = fs::read_to_string(&scenario_file)?;
    let mut scenario: Scenario = toml::from_str(&content)?;

    apply_environment_overrides(&mut scenario);
    validate_scenario(&scenario)?;

    Ok(scenario)
}

/// Apply environment variable overrides to a parsed scenario
///
/// Supported variables:
/// - `SPIKEFLOW_SEED` -> `simulation.seed`
/// - `SPIKEFLOW_DURATION_MS` -> `simulation.duration_ms`
/// - `SPIKEFLOW_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(scenario: &mut Scenario) {
    if let Ok(value) = env::var("SPIKEFLOW_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            scenario.simulation.seed = seed;
        }
    }
    if let Ok(value) = env::var("SPIKEFLOW_DURATION_MS") {
        if let Ok(duration) = value.parse::<f64>() {
            scenario.simulation.duration_ms = duration;
        }
    }
    if let Ok(value) = env::var("SPIKEFLOW_LOG_LEVEL") {
        scenario.logging.level = value;
    }
}
