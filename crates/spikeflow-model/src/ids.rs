// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Identity types for populations and neurons

use core::fmt;
use serde::{Deserialize, Serialize};

/// Population ID (index into the network's population table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationId(pub u32);

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Population({})", self.0)
    }
}

/// Neuron index (local to its population)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeuronIdx(pub u32);

impl fmt::Display for NeuronIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// A threshold crossing emitted by a population.
///
/// Ephemeral: produced at detection, consumed by projections within the
/// bounded delay horizon, then dropped. Never persisted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    pub population: PopulationId,
    pub neuron: NeuronIdx,
    /// Clock time of the detection step, in ms.
    pub time: f64,
}
