// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikeflow Engine
//!
//! The hybrid continuous/discrete-event core: per-step Euler integration of
//! membrane state, threshold detection with refractory gating, delayed spike
//! delivery into synaptic conductances, and event-driven trace decay for
//! timing-dependent plasticity.
//!
//! The network (populations, projections, inputs) is built once from
//! configuration and passed in; only state mutates during a run. Outputs go
//! to a write-only [`recorder::ObservationSink`] that never feeds back into
//! the dynamics.

pub mod clock;
pub mod error;
pub mod input;
pub mod population;
pub mod projection;
pub mod recorder;
pub mod ring;
pub mod simulation;
pub mod wiring;

pub use clock::Clock;
pub use error::{BuildError, BuildResult, SimResult, SimulationError};
pub use input::InputStream;
pub use population::Population;
pub use projection::Projection;
pub use recorder::{
    ChannelForwarder, MemoryRecorder, NullSink, Observation, ObservationSink, RecordVariable,
    RecordingConfig, SnapshotKey,
};
pub use simulation::{RunReport, Simulation};
pub use wiring::{ConnectivityPolicy, ConnectivitySummary, WeightInit};

/// Derive an independent RNG stream seed from the master seed.
///
/// SplitMix64 finalizer over `master + stream`; distinct stream indices give
/// decorrelated `SmallRng` seeds so connectivity, weight init, every input
/// stream, and every noise stream draw from fixed, independent sequences.
pub fn derive_seed(master: u64, stream: u64) -> u64 {
    let mut z = master
        .wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
