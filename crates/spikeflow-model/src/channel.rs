// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Synaptic Channel Math
//!
//! Pure functions computing per-channel current contributions from state and
//! voltage. Each channel contributes `g * (v - E) * gate`; the NMDA channel is
//! additionally scaled by a voltage-gated block factor that must be
//! recomputed from the instantaneous voltage every step, never cached.
//!
//! Channel kinds are statically tagged: the projection's configured kind
//! selects the data+update pair at build time. No equation strings exist at
//! runtime.

use crate::params::NeuronParams;
use serde::{Deserialize, Serialize};

/// Statically tagged synaptic channel kind, selected per projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Fast recurrent excitation; delivery adds `w` to the target's AMPA gate.
    Ampa,
    /// Recurrent inhibition; delivery adds a unit quantum to the GABA gate.
    Gaba,
    /// Slow voltage-gated excitation with a saturating rise variable; the
    /// per-neuron total is a weighted many-to-one reduction over connections.
    Nmda,
    /// Direct membrane kick; delivery adds `w` to the target's voltage.
    Delta,
}

/// Voltage-gated magnesium block factor for the NMDA channel:
/// `1 / (1 + mg * exp(-0.062 * v) / 3.57)` with `v` in mV.
///
/// Saturating in `v`: approaches 1 at depolarized voltages, suppresses the
/// channel near rest.
#[inline(always)]
pub fn nmda_block_factor(v: f64, mg: f64) -> f64 {
    1.0 / (1.0 + mg * (-0.062 * v).exp() / 3.57)
}

/// Total synaptic current (pA) for one neuron given its gates and voltage.
///
/// Four independently modeled channels: always-open external AMPA drive,
/// recurrent AMPA, blocked NMDA, and GABA. Sign convention: positive current
/// hyperpolarizes (it enters the membrane equation as `-i_syn`).
#[inline(always)]
pub fn synaptic_current(
    params: &NeuronParams,
    v: f64,
    s_ampa_ext: f64,
    s_ampa: f64,
    s_nmda_tot: f64,
    s_gaba: f64,
) -> f64 {
    let i_ampa_ext = params.g_ampa_ext * (v - params.e_ampa) * s_ampa_ext;
    let i_ampa = params.g_ampa * (v - params.e_ampa) * s_ampa;
    let i_nmda = params.g_nmda * (v - params.e_ampa) * nmda_block_factor(v, params.mg) * s_nmda_tot;
    let i_gaba = params.g_gaba * (v - params.e_gaba) * s_gaba;
    i_ampa_ext + i_ampa + i_nmda + i_gaba
}

/// One forward-Euler step of the membrane equation (returns the new voltage):
/// `dv = dt * (-g_leak * (v - v_rest) - i_syn + i_ext) / c_m`.
#[inline(always)]
pub fn membrane_step(params: &NeuronParams, v: f64, i_syn: f64, i_ext: f64, dt: f64) -> f64 {
    v + dt * (-params.g_leak * (v - params.v_rest) - i_syn + i_ext) / params.c_m
}

/// Exact one-step decay factor `exp(-dt / tau)` for a linear first-order
/// trace. Precomputed once at build; applying it each step reproduces the
/// event-driven (exact) solution rather than a forward-Euler approximation.
#[inline]
pub fn decay_factor(dt: f64, tau: f64) -> f64 {
    (-dt / tau).exp()
}
