// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario type definitions
//!
//! These structs map one-to-one onto the sections of a scenario TOML file.
//! Every section is optional and falls back to its defaults; entries inside
//! `[[populations]]` and `[[projections]]` name their required fields
//! explicitly.

use serde::{Deserialize, Serialize};
use spikeflow_engine::{ConnectivityPolicy, RecordingConfig, WeightInit};
use spikeflow_model::{ChannelKind, InputParams, NeuronParams, StdpParams};
use std::path::PathBuf;

/// Root scenario structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Scenario {
    pub simulation: SimulationConfig,
    pub populations: Vec<PopulationConfig>,
    pub projections: Vec<ProjectionConfig>,
    pub recording: RecordingConfig,
    pub logging: LoggingConfig,
}

/// Global run parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration step (ms)
    pub dt: f64,
    /// Run length (ms); the last partial step still runs
    pub duration_ms: f64,
    /// Master seed; all RNG streams are derived from it
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            duration_ms: 1000.0,
            seed: 0,
        }
    }
}

/// One `[[populations]]` entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PopulationConfig {
    pub name: String,
    pub size: u32,
    /// Neuron constants; omitted fields fall back to the pyramidal defaults
    #[serde(default)]
    pub neuron: NeuronParams,
    /// Optional exogenous drive for this population
    #[serde(default)]
    pub input: Option<InputParams>,
}

/// One `[[projections]]` entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectionConfig {
    pub name: String,
    /// Source population name
    pub source: String,
    /// Target population name
    pub target: String,
    pub channel: ChannelKind,
    pub policy: ConnectivityPolicy,
    #[serde(default = "default_weight_init")]
    pub weight: WeightInit,
    /// Upper weight bound; also scales uniform initial weights
    pub w_max: f64,
    /// Transmission delay (ms), rounded to whole steps
    #[serde(default)]
    pub delay_ms: f64,
    /// Pair-based plasticity; `None` freezes the weights
    #[serde(default)]
    pub stdp: Option<StdpParams>,
}

fn default_weight_init() -> WeightInit {
    WeightInit::Constant { value: 1.0 }
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level (`error`/`warn`/`info`/`debug`/`trace`);
    /// `SPIKEFLOW_LOG` overrides it with a full filter expression
    pub level: String,
    /// Optional log file alongside console output
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
