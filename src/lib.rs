// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikeflow
//!
//! Hybrid continuous/discrete-event simulation engine for spiking
//! point-neuron networks: leaky integrate-and-fire membranes under forward
//! Euler, conductance-based AMPA/NMDA/GABA channels, pair-based
//! spike-timing-dependent plasticity, delayed spike delivery, and seeded
//! Poisson or sinusoidal drive.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! spikeflow = "0.1"
//! ```
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use spikeflow::prelude::*;
//!
//! // Describe the network in TOML (spikeflow.toml next to the binary).
//! let scenario = spikeflow::config::load_scenario(None)?;
//!
//! // Build it with every RNG stream derived from the scenario seed.
//! let recorder = Arc::new(Mutex::new(MemoryRecorder::new()));
//! let mut sim = build_simulation(&scenario, Box::new(recorder.clone()))?;
//!
//! // Step to the configured duration.
//! let report = sim.run()?;
//! println!("{} spikes over {} ms", report.total_spikes, report.duration_ms);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: spikeflow-model                            │
//! │  (ids, parameter sets, channel math)                    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: spikeflow-engine                               │
//! │  (populations, projections, wiring, inputs, clock,     │
//! │   stepping loop, observation sinks)                     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Assembly: spikeflow-config + this crate's builder      │
//! │  (TOML scenario -> validated, seeded Simulation)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-cutting: `spikeflow-observability` wires the tracing subscriber for
//! binaries that embed the engine.

mod build;

// Re-export foundation
pub use spikeflow_model as model;

// Re-export the engine
pub use spikeflow_engine as engine;

// Re-export assembly layers
pub use spikeflow_config as config;
pub use spikeflow_observability as observability;

pub use build::build_simulation;

// The engine hands out parking_lot-guarded sinks; re-export so callers don't
// need their own dependency on it.
pub use parking_lot;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::build::build_simulation;
    pub use crate::config::{load_scenario, Scenario};
    pub use crate::engine::{
        BuildError, ChannelForwarder, Clock, ConnectivityPolicy, MemoryRecorder, NullSink,
        Observation, ObservationSink, RecordVariable, RecordingConfig, RunReport, Simulation,
        SimulationError, WeightInit,
    };
    pub use crate::model::{
        ChannelKind, InputParams, NeuronParams, PopulationId, SpikeEvent, StdpParams,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _id = PopulationId(0);
        let _params = NeuronParams::default();
    }
}
