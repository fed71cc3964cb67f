// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario assembly
//!
//! Turns a validated [`Scenario`] into a ready-to-run [`Simulation`]. Every
//! source of randomness (wiring, initial weights, Poisson drive, membrane
//! noise) gets its own stream derived from the scenario's master seed, so
//! two builds from the same file are identical and adding one more stream
//! never shifts the others.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use spikeflow_config::Scenario;
use spikeflow_engine::wiring::{init_weights, realize_edges};
use spikeflow_engine::{
    derive_seed, BuildError, BuildResult, Clock, InputStream, ObservationSink, Population,
    Projection, Simulation,
};
use spikeflow_model::PopulationId;
use tracing::debug;

// Stream-index bases per randomness consumer. Populations use their own
// index, projections two slots each (wiring, weights).
const NOISE_STREAM_BASE: u64 = 0;
const INPUT_STREAM_BASE: u64 = 1 << 16;
const WIRING_STREAM_BASE: u64 = 2 << 16;

/// Build a [`Simulation`] from a scenario, routing observations to `sink`.
///
/// The scenario is expected to have passed
/// [`spikeflow_config::validate_scenario`]; structural errors that slip
/// through (unknown endpoints, empty referenced populations, bad parameter
/// sets) are still caught here and reported as [`BuildError`]s.
pub fn build_simulation(
    scenario: &Scenario,
    sink: Box<dyn ObservationSink>,
) -> BuildResult<Simulation> {
    let dt = scenario.simulation.dt;
    let seed = scenario.simulation.seed;
    let clock = Clock::new(dt, scenario.simulation.duration_ms)?;

    let mut populations = Vec::with_capacity(scenario.populations.len());
    let mut inputs = Vec::new();
    for (idx, pop) in scenario.populations.iter().enumerate() {
        let violations = pop.neuron.violations();
        if !violations.is_empty() {
            return Err(BuildError::InvalidParameters(pop.name.clone(), violations));
        }
        let id = PopulationId(idx as u32);
        populations.push(Population::new(
            id,
            pop.name.clone(),
            pop.size as usize,
            pop.neuron,
            dt,
            derive_seed(seed, NOISE_STREAM_BASE + idx as u64),
        ));

        if let Some(input) = pop.input {
            let violations = input.violations();
            if !violations.is_empty() || pop.size == 0 {
                return Err(BuildError::InvalidInput(pop.name.clone(), violations));
            }
            inputs.push(InputStream::new(
                id,
                input,
                dt,
                derive_seed(seed, INPUT_STREAM_BASE + idx as u64),
            ));
        }
    }

    let resolve = |projection: &str, name: &str| -> BuildResult<PopulationId> {
        let idx = scenario
            .populations
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| {
                BuildError::UnknownPopulation(projection.to_string(), name.to_string())
            })?;
        if scenario.populations[idx].size == 0 {
            return Err(BuildError::EmptyEndpoint(
                projection.to_string(),
                name.to_string(),
            ));
        }
        Ok(PopulationId(idx as u32))
    };

    let mut projections = Vec::with_capacity(scenario.projections.len());
    for (idx, proj) in scenario.projections.iter().enumerate() {
        let source = resolve(&proj.name, &proj.source)?;
        let target = resolve(&proj.name, &proj.target)?;
        if let spikeflow_engine::ConnectivityPolicy::Bernoulli { p, .. } = proj.policy {
            if !(0.0..=1.0).contains(&p) {
                return Err(BuildError::InvalidProbability(proj.name.clone(), p));
            }
        }
        if !(proj.w_max > 0.0) || !proj.w_max.is_finite() {
            return Err(BuildError::InvalidWeightBound(proj.name.clone(), proj.w_max));
        }
        if proj.delay_ms < 0.0 || !proj.delay_ms.is_finite() {
            return Err(BuildError::InvalidDelay(proj.name.clone(), proj.delay_ms));
        }

        let n_pre = populations[source.0 as usize].len();
        let n_post = populations[target.0 as usize].len();
        let mut wiring_rng =
            SmallRng::seed_from_u64(derive_seed(seed, WIRING_STREAM_BASE + 2 * idx as u64));
        let (pre, post) = realize_edges(proj.policy, n_pre, n_post, source == target, &mut wiring_rng);
        let mut weight_rng =
            SmallRng::seed_from_u64(derive_seed(seed, WIRING_STREAM_BASE + 2 * idx as u64 + 1));
        let w = init_weights(proj.weight, pre.len(), proj.w_max, &mut weight_rng);

        let delay_steps = (proj.delay_ms / dt).round() as u64;
        debug!(
            projection = %proj.name,
            edges = pre.len(),
            delay_steps,
            plastic = proj.stdp.is_some(),
            "projection realized"
        );
        projections.push(Projection::new(
            proj.name.clone(),
            source,
            target,
            proj.channel,
            pre,
            post,
            w,
            proj.w_max,
            delay_steps,
            dt,
            &scenario.populations[target.0 as usize].neuron,
            proj.stdp,
            n_pre,
            n_post,
        ));
    }

    Ok(Simulation::new(
        clock,
        populations,
        projections,
        inputs,
        scenario.recording.clone(),
        sink,
    ))
}
