// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario validation
//!
//! Structural and numeric checks run after parsing and before any network is
//! built. All violations are collected so a bad scenario fails once with the
//! complete list.

use crate::{ConfigError, ConfigResult, Scenario};
use spikeflow_engine::{ConnectivityPolicy, WeightInit};
use spikeflow_model::InputParams;

/// One violation found while validating a scenario
#[derive(Debug, Clone)]
pub enum ScenarioValidationError {
    InvalidTimeStep { dt: f64 },
    InvalidDuration { duration_ms: f64 },
    DuplicatePopulation { name: String },
    DuplicateProjection { name: String },
    UnknownPopulation { projection: String, name: String },
    EmptyEndpoint { projection: String, population: String },
    InvalidProbability { projection: String, p: f64 },
    InvalidWeightBound { projection: String, w_max: f64 },
    InitialWeightOutOfRange { projection: String, value: f64 },
    InvalidDelay { projection: String, delay_ms: f64 },
    Parameter { scope: String, message: String },
}

impl std::fmt::Display for ScenarioValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeStep { dt } => {
                write!(f, "simulation.dt = {} must be a positive finite number", dt)
            }
            Self::InvalidDuration { duration_ms } => {
                write!(
                    f,
                    "simulation.duration_ms = {} must be non-negative and finite",
                    duration_ms
                )
            }
            Self::DuplicatePopulation { name } => {
                write!(f, "population name '{}' is used more than once", name)
            }
            Self::DuplicateProjection { name } => {
                write!(f, "projection name '{}' is used more than once", name)
            }
            Self::UnknownPopulation { projection, name } => {
                write!(
                    f,
                    "projection '{}' references unknown population '{}'",
                    projection, name
                )
            }
            Self::EmptyEndpoint {
                projection,
                population,
            } => {
                write!(
                    f,
                    "projection '{}' references population '{}' which has size 0",
                    projection, population
                )
            }
            Self::InvalidProbability { projection, p } => {
                write!(
                    f,
                    "projection '{}' connection probability {} is outside [0, 1]",
                    projection, p
                )
            }
            Self::InvalidWeightBound { projection, w_max } => {
                write!(
                    f,
                    "projection '{}' w_max = {} must be positive and finite",
                    projection, w_max
                )
            }
            Self::InitialWeightOutOfRange { projection, value } => {
                write!(
                    f,
                    "projection '{}' initial weight {} is outside [0, w_max]",
                    projection, value
                )
            }
            Self::InvalidDelay {
                projection,
                delay_ms,
            } => {
                write!(
                    f,
                    "projection '{}' delay_ms = {} must be non-negative and finite",
                    projection, delay_ms
                )
            }
            Self::Parameter { scope, message } => {
                write!(f, "{}: {}", scope, message)
            }
        }
    }
}

/// Validate a parsed scenario end to end.
///
/// Checks simulation bounds, population name uniqueness, per-population
/// neuron and input parameters, projection endpoint references (including
/// size-0 populations, which are only fatal once something connects to
/// them), and per-projection numeric ranges.
pub fn validate_scenario(scenario: &Scenario) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(scenario, &mut errors);
    validate_populations(scenario, &mut errors);
    validate_projections(scenario, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");
        Err(ConfigError::ValidationError(messages))
    }
}

fn validate_simulation(scenario: &Scenario, errors: &mut Vec<ScenarioValidationError>) {
    let sim = &scenario.simulation;
    if !(sim.dt > 0.0) || !sim.dt.is_finite() {
        errors.push(ScenarioValidationError::InvalidTimeStep { dt: sim.dt });
    }
    if sim.duration_ms < 0.0 || !sim.duration_ms.is_finite() {
        errors.push(ScenarioValidationError::InvalidDuration {
            duration_ms: sim.duration_ms,
        });
    }
}

fn validate_populations(scenario: &Scenario, errors: &mut Vec<ScenarioValidationError>) {
    let mut seen = Vec::new();
    for pop in &scenario.populations {
        if seen.contains(&&pop.name) {
            errors.push(ScenarioValidationError::DuplicatePopulation {
                name: pop.name.clone(),
            });
        } else {
            seen.push(&pop.name);
        }

        for violation in pop.neuron.violations() {
            errors.push(ScenarioValidationError::Parameter {
                scope: format!("population '{}' neuron", pop.name),
                message: violation.to_string(),
            });
        }
        if let Some(input) = &pop.input {
            if pop.size == 0 {
                errors.push(ScenarioValidationError::Parameter {
                    scope: format!("population '{}'", pop.name),
                    message: "input attached to a population with size 0".to_string(),
                });
            }
            for violation in input.violations() {
                errors.push(ScenarioValidationError::Parameter {
                    scope: format!("population '{}' input", pop.name),
                    message: violation.to_string(),
                });
            }
            // Poisson drive needs a stable per-step line probability.
            if let InputParams::Poisson { rate_hz, .. } = input {
                let p = rate_hz * scenario.simulation.dt * 1e-3;
                if p > 1.0 {
                    errors.push(ScenarioValidationError::Parameter {
                        scope: format!("population '{}' input", pop.name),
                        message: format!(
                            "rate_hz * dt gives per-step probability {} > 1; reduce rate or dt",
                            p
                        ),
                    });
                }
            }
        }
    }
}

fn validate_projections(scenario: &Scenario, errors: &mut Vec<ScenarioValidationError>) {
    let mut seen = Vec::new();
    for proj in &scenario.projections {
        if seen.contains(&&proj.name) {
            errors.push(ScenarioValidationError::DuplicateProjection {
                name: proj.name.clone(),
            });
        } else {
            seen.push(&proj.name);
        }

        for endpoint in [&proj.source, &proj.target] {
            match scenario.populations.iter().find(|p| &p.name == endpoint) {
                None => errors.push(ScenarioValidationError::UnknownPopulation {
                    projection: proj.name.clone(),
                    name: endpoint.clone(),
                }),
                Some(pop) if pop.size == 0 => {
                    errors.push(ScenarioValidationError::EmptyEndpoint {
                        projection: proj.name.clone(),
                        population: endpoint.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if let ConnectivityPolicy::Bernoulli { p, .. } = proj.policy {
            if !(0.0..=1.0).contains(&p) || !p.is_finite() {
                errors.push(ScenarioValidationError::InvalidProbability {
                    projection: proj.name.clone(),
                    p,
                });
            }
        }
        if !(proj.w_max > 0.0) || !proj.w_max.is_finite() {
            errors.push(ScenarioValidationError::InvalidWeightBound {
                projection: proj.name.clone(),
                w_max: proj.w_max,
            });
        }
        if let WeightInit::Constant { value } = proj.weight {
            if !(0.0..=proj.w_max).contains(&value) {
                errors.push(ScenarioValidationError::InitialWeightOutOfRange {
                    projection: proj.name.clone(),
                    value,
                });
            }
        }
        if proj.delay_ms < 0.0 || !proj.delay_ms.is_finite() {
            errors.push(ScenarioValidationError::InvalidDelay {
                projection: proj.name.clone(),
                delay_ms: proj.delay_ms,
            });
        }
        if let Some(stdp) = &proj.stdp {
            for violation in stdp.violations() {
                errors.push(ScenarioValidationError::Parameter {
                    scope: format!("projection '{}' stdp", proj.name),
                    message: violation.to_string(),
                });
            }
        }
    }
}
