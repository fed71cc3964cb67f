// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Observation Sinks
//!
//! Write-only outputs of the engine: spike streams, periodic state
//! snapshots, and per-population spike-count bins. Every observation is an
//! immutable copy of engine state; nothing a sink does can feed back into
//! the dynamics.
//!
//! The bundled [`ChannelForwarder`] never blocks the stepping loop: when the
//! drain side lags, observations are counted and dropped.

use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use spikeflow_model::{NeuronIdx, PopulationId, SpikeEvent};
use tracing::warn;

/// What a snapshot was measured on.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotKey {
    Population(PopulationId),
    /// Projection snapshots (weights) are keyed by projection name.
    Projection(String),
}

/// One immutable observation handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// All spikes one population emitted in one step.
    Spikes {
        population: PopulationId,
        time: f64,
        neurons: Vec<u32>,
    },
    /// Periodic copy of one continuous variable across a population or
    /// projection.
    Snapshot {
        time: f64,
        variable: &'static str,
        key: SnapshotKey,
        values: Vec<f64>,
    },
    /// Spike count for one population over one closed bin. Rate smoothing is
    /// applied post hoc, outside the engine; every bin is keyed by the
    /// population it was measured on.
    RateBin {
        population: PopulationId,
        t_start: f64,
        t_end: f64,
        count: u64,
    },
}

/// Continuous variables that can be snapshotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordVariable {
    V,
    SAmpaExt,
    SAmpa,
    SGaba,
    SNmdaTot,
    /// Projection weights rather than a population variable
    Weights,
}

impl RecordVariable {
    pub fn name(self) -> &'static str {
        match self {
            RecordVariable::V => "v",
            RecordVariable::SAmpaExt => "s_ampa_ext",
            RecordVariable::SAmpa => "s_ampa",
            RecordVariable::SGaba => "s_gaba",
            RecordVariable::SNmdaTot => "s_nmda_tot",
            RecordVariable::Weights => "w",
        }
    }
}

/// What and how often to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Snapshot cadence in steps; 0 disables snapshots
    pub sample_every: u64,
    pub variables: Vec<RecordVariable>,
    /// Rate-bin width in steps; 0 disables rate bins
    pub rate_bin: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_every: 0,
            variables: Vec::new(),
            rate_bin: 0,
        }
    }
}

/// Receives observations from the stepping loop.
pub trait ObservationSink: Send {
    fn observe(&mut self, observation: Observation);
}

/// Discards everything.
pub struct NullSink;

impl ObservationSink for NullSink {
    fn observe(&mut self, _observation: Observation) {}
}

/// In-memory recorder, convenient for tests and short runs.
#[derive(Default)]
pub struct MemoryRecorder {
    pub spikes: Vec<(PopulationId, f64, Vec<u32>)>,
    pub snapshots: Vec<(f64, &'static str, SnapshotKey, Vec<f64>)>,
    pub rate_bins: Vec<(PopulationId, f64, f64, u64)>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total spike count across all populations.
    pub fn total_spikes(&self) -> u64 {
        self.spikes.iter().map(|(_, _, n)| n.len() as u64).sum()
    }

    /// Flatten the per-step spike records into individual events.
    pub fn events(&self) -> Vec<SpikeEvent> {
        self.spikes
            .iter()
            .flat_map(|(population, time, neurons)| {
                neurons.iter().map(|&n| SpikeEvent {
                    population: *population,
                    neuron: NeuronIdx(n),
                    time: *time,
                })
            })
            .collect()
    }

    /// Spike times of one neuron in one population.
    pub fn spike_times(&self, population: PopulationId, neuron: u32) -> Vec<f64> {
        self.spikes
            .iter()
            .filter(|(p, _, neurons)| *p == population && neurons.contains(&neuron))
            .map(|(_, t, _)| *t)
            .collect()
    }
}

impl ObservationSink for MemoryRecorder {
    fn observe(&mut self, observation: Observation) {
        match observation {
            Observation::Spikes {
                population,
                time,
                neurons,
            } => self.spikes.push((population, time, neurons)),
            Observation::Snapshot {
                time,
                variable,
                key,
                values,
            } => self.snapshots.push((time, variable, key, values)),
            Observation::RateBin {
                population,
                t_start,
                t_end,
                count,
            } => self.rate_bins.push((population, t_start, t_end, count)),
        }
    }
}

/// Shared handle so callers can keep inspecting a sink they handed to the
/// engine.
impl<S: ObservationSink> ObservationSink for Arc<Mutex<S>> {
    fn observe(&mut self, observation: Observation) {
        self.lock().observe(observation)
    }
}

/// Forwards observations over a bounded channel without ever blocking the
/// stepping loop. A slow drain side shows up as a drop counter and a
/// throttled warning, never as backpressure on the simulation.
pub struct ChannelForwarder {
    tx: Sender<Observation>,
    dropped: u64,
}

impl ChannelForwarder {
    pub fn bounded(capacity: usize) -> (Self, Receiver<Observation>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Observations lost to a lagging drain side.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl ObservationSink for ChannelForwarder {
    fn observe(&mut self, observation: Observation) {
        match self.tx.try_send(observation) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                // Throttle: warn on the first drop and every 4096 after.
                if self.dropped % 4096 == 1 {
                    warn!(dropped = self.dropped, "observation sink lagging, dropping");
                }
            }
        }
    }
}
