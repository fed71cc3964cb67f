// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikeflow Model Layer
//!
//! Platform-agnostic foundation for the simulation engine: identity types,
//! immutable parameter sets, and the pure per-channel current math.
//!
//! Nothing in this crate owns mutable simulation state. The engine crate owns
//! state and calls into these functions every step.

pub mod channel;
pub mod ids;
pub mod params;

pub use channel::{decay_factor, membrane_step, nmda_block_factor, synaptic_current, ChannelKind};
pub use ids::{NeuronIdx, PopulationId, SpikeEvent};
pub use params::{InputParams, NeuronParams, ParamError, StdpParams};
