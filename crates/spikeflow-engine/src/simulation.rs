// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Stepping Loop
//!
//! Owns the fully built network and advances it step by step under a strict
//! phase order, per step:
//!
//!   (a) apply queued delayed deliveries arriving now
//!   (b) emit exogenous input events, then integrate every population using
//!       conductances accumulated through the end of the previous step
//!   (c) detect threshold crossings
//!   (d) apply resets + refractory, record spikes
//!   (e) pre-side synaptic effects for every emitted spike, then post-side
//!       plasticity updates
//!   (f) decay all continuous traces, recompute the NMDA reductions
//!
//! The barrier between (b)/(c) and (e) means a spike can never influence
//! another neuron's detection in the step it was emitted.
//!
//! The network is an explicit, passed-in object: populations, projections
//! and inputs are constructed before stepping and structurally immutable for
//! the run.

use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::error::{SimResult, SimulationError};
use crate::input::InputStream;
use crate::population::Population;
use crate::projection::Projection;
use crate::recorder::{Observation, ObservationSink, RecordVariable, RecordingConfig, SnapshotKey};
use crate::wiring::ConnectivitySummary;

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub steps: u64,
    pub duration_ms: f64,
    pub total_spikes: u64,
}

pub struct Simulation {
    clock: Clock,
    populations: Vec<Population>,
    projections: Vec<Projection>,
    inputs: Vec<InputStream>,
    recording: RecordingConfig,
    sink: Box<dyn ObservationSink>,

    /// Spike counts for the currently open rate bin, one per population
    bin_counts: Vec<u64>,
    bin_start: u64,
    total_spikes: u64,
    /// Scratch buffer for per-population external currents
    ext_current: Vec<f64>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("clock", &self.clock)
            .field("populations", &self.populations.len())
            .field("projections", &self.projections.len())
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn new(
        clock: Clock,
        populations: Vec<Population>,
        projections: Vec<Projection>,
        inputs: Vec<InputStream>,
        recording: RecordingConfig,
        sink: Box<dyn ObservationSink>,
    ) -> Self {
        let n = populations.len();
        debug!(
            populations = n,
            projections = projections.len(),
            inputs = inputs.len(),
            steps = clock.n_steps(),
            dt = clock.dt(),
            "network built"
        );
        Self {
            clock,
            populations,
            projections,
            inputs,
            recording,
            sink,
            bin_counts: vec![0; n],
            bin_start: 0,
            total_spikes: 0,
            ext_current: vec![0.0; n],
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    /// Realized-edge statistics, queryable post-run.
    pub fn connectivity_summaries(&self) -> Vec<&ConnectivitySummary> {
        self.projections.iter().map(|p| p.summary()).collect()
    }

    /// Advance the network by one step through phases (a)-(f).
    pub fn step(&mut self) -> SimResult<()> {
        let Self {
            clock,
            populations,
            projections,
            inputs,
            recording,
            sink,
            bin_counts,
            bin_start,
            total_spikes,
            ext_current,
        } = self;
        let step = clock.step();
        let now = clock.time();
        let dt = clock.dt();

        // (a) queued deliveries whose arrival step is now
        for proj in projections.iter_mut() {
            let target = &mut populations[proj.target.0 as usize];
            proj.deliver_due(step, target);
        }

        // exogenous events and deterministic currents for this step
        ext_current.iter_mut().for_each(|c| *c = 0.0);
        for input in inputs.iter_mut() {
            let idx = input.target.0 as usize;
            ext_current[idx] += input.drive(now, &mut populations[idx]);
        }

        // (b) integrate every population
        for (idx, pop) in populations.iter_mut().enumerate() {
            if let Some(neuron) = pop.integrate(dt, ext_current[idx]) {
                return Err(SimulationError::DivergedVoltage {
                    population: pop.id,
                    neuron,
                    step,
                });
            }
        }

        // (c) detect, (d) reset + refractory + record
        let spikes: Vec<Vec<u32>> = populations.iter().map(|p| p.detect_spikes()).collect();
        for (pop, fired) in populations.iter_mut().zip(&spikes) {
            if fired.is_empty() {
                continue;
            }
            pop.apply_resets(fired);
            let idx = pop.id.0 as usize;
            bin_counts[idx] += fired.len() as u64;
            *total_spikes += fired.len() as u64;
            sink.observe(Observation::Spikes {
                population: pop.id,
                time: now,
                neurons: fired.clone(),
            });
        }

        // (e) pre-side effects strictly before post-side plasticity
        for proj in projections.iter_mut() {
            let fired = &spikes[proj.source.0 as usize];
            if !fired.is_empty() {
                let target = &mut populations[proj.target.0 as usize];
                proj.on_pre_spikes(fired, step, target);
            }
        }
        for proj in projections.iter_mut() {
            let fired = &spikes[proj.target.0 as usize];
            if !fired.is_empty() {
                proj.on_post_spikes(fired);
            }
        }

        // (f) exact/Euler trace decay, then the many-to-one NMDA reduction
        for pop in populations.iter_mut() {
            pop.decay_gates();
            pop.s_nmda_tot.fill(0.0);
        }
        for proj in projections.iter_mut() {
            if let Some(connection) = proj.decay_traces() {
                return Err(SimulationError::DivergedTrace {
                    projection: proj.name.clone(),
                    connection,
                    step,
                });
            }
        }
        for proj in projections.iter() {
            let target = &mut populations[proj.target.0 as usize];
            proj.accumulate_nmda(target);
        }

        // periodic snapshots
        if recording.sample_every > 0 && step % recording.sample_every == 0 {
            Self::emit_snapshots(populations, projections, recording, sink.as_mut(), now);
        }

        // rate bins close on their last step
        if recording.rate_bin > 0 && (step + 1) % recording.rate_bin == 0 {
            for pop in populations.iter() {
                let idx = pop.id.0 as usize;
                sink.observe(Observation::RateBin {
                    population: pop.id,
                    t_start: *bin_start as f64 * dt,
                    t_end: (step + 1) as f64 * dt,
                    count: bin_counts[idx],
                });
                bin_counts[idx] = 0;
            }
            *bin_start = step + 1;
        }

        trace!(step, spiked = spikes.iter().map(Vec::len).sum::<usize>());
        clock.advance();
        Ok(())
    }

    fn emit_snapshots(
        populations: &[Population],
        projections: &[Projection],
        recording: &RecordingConfig,
        sink: &mut dyn ObservationSink,
        now: f64,
    ) {
        for &variable in &recording.variables {
            if variable == RecordVariable::Weights {
                for proj in projections {
                    sink.observe(Observation::Snapshot {
                        time: now,
                        variable: variable.name(),
                        key: SnapshotKey::Projection(proj.name.clone()),
                        values: proj.weights().to_vec(),
                    });
                }
                continue;
            }
            for pop in populations {
                let values = match variable {
                    RecordVariable::V => pop.v.clone(),
                    RecordVariable::SAmpaExt => pop.s_ampa_ext.clone(),
                    RecordVariable::SAmpa => pop.s_ampa.clone(),
                    RecordVariable::SGaba => pop.s_gaba.clone(),
                    RecordVariable::SNmdaTot => pop.s_nmda_tot.clone(),
                    RecordVariable::Weights => unreachable!(),
                };
                sink.observe(Observation::Snapshot {
                    time: now,
                    variable: variable.name(),
                    key: SnapshotKey::Population(pop.id),
                    values,
                });
            }
        }
    }

    /// Run to the configured duration (or until a fatal numerical error).
    pub fn run(&mut self) -> SimResult<RunReport> {
        info!(steps = self.clock.n_steps(), dt = self.clock.dt(), "run started");
        while !self.clock.is_finished() {
            self.step()?;
        }
        // Close a trailing partial rate bin.
        if self.recording.rate_bin > 0 && self.bin_start < self.clock.step() {
            let dt = self.clock.dt();
            let end = self.clock.step();
            for pop in &self.populations {
                let idx = pop.id.0 as usize;
                self.sink.observe(Observation::RateBin {
                    population: pop.id,
                    t_start: self.bin_start as f64 * dt,
                    t_end: end as f64 * dt,
                    count: self.bin_counts[idx],
                });
                self.bin_counts[idx] = 0;
            }
            self.bin_start = end;
        }
        let report = RunReport {
            steps: self.clock.step(),
            duration_ms: self.clock.time(),
            total_spikes: self.total_spikes,
        };
        info!(
            steps = report.steps,
            spikes = report.total_spikes,
            "run finished"
        );
        Ok(report)
    }
}
