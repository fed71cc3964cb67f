// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine error types

use spikeflow_model::{ParamError, PopulationId};
use thiserror::Error;

/// Errors detected while assembling the network, before any stepping.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("time step dt must be positive (got {0})")]
    InvalidTimeStep(f64),

    #[error("duration must be non-negative (got {0})")]
    InvalidDuration(f64),

    #[error("population '{0}' has invalid parameters: {1:?}")]
    InvalidParameters(String, Vec<ParamError>),

    #[error("projection '{0}' references unknown population '{1}'")]
    UnknownPopulation(String, String),

    #[error("projection '{0}' endpoint population '{1}' has no neurons")]
    EmptyEndpoint(String, String),

    #[error("projection '{0}' connection probability {1} outside [0, 1]")]
    InvalidProbability(String, f64),

    #[error("projection '{0}' weight bound w_max must be non-negative (got {1})")]
    InvalidWeightBound(String, f64),

    #[error("projection '{0}' delay must be non-negative (got {1} ms)")]
    InvalidDelay(String, f64),

    #[error("input for population '{0}' is invalid: {1:?}")]
    InvalidInput(String, Vec<ParamError>),
}

/// Fatal runtime faults. A divergence indicates a parameter/time-step
/// mismatch, so the run is aborted and never retried.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error(
        "non-finite membrane potential in population {population} \
         (neuron {neuron}) at step {step}: Euler step too large for the \
         configured time constants"
    )]
    DivergedVoltage {
        population: PopulationId,
        neuron: u32,
        step: u64,
    },

    #[error(
        "non-finite synaptic trace in projection '{projection}' \
         (connection {connection}) at step {step}"
    )]
    DivergedTrace {
        projection: String,
        connection: usize,
        step: u64,
    },
}

pub type BuildResult<T> = Result<T, BuildError>;
pub type SimResult<T> = Result<T, SimulationError>;
