// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # External Input Generator
//!
//! Exogenous drive, independent of network state. A Poisson stream models
//! `c_ext` virtual input lines per neuron, each approximated per step as a
//! Bernoulli trial with `p = rate * dt` (valid while `rate * dt << 1`); every
//! success increments the target's external AMPA gate. A sine stream is a
//! deterministic current with no state beyond the clock's time.
//!
//! Streams own only their RNG cursor; identical seeds produce identical
//! trains.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use spikeflow_model::{InputParams, PopulationId};

use crate::population::Population;

enum InputKind {
    Poisson {
        /// Per-line spike probability per step, `rate_hz * dt / 1000`
        p_line: f64,
        c_ext: u32,
        rng: SmallRng,
    },
    Sine {
        amplitude_pa: f64,
        /// Angular frequency in rad/ms
        omega: f64,
    },
}

pub struct InputStream {
    pub target: PopulationId,
    kind: InputKind,
}

impl InputStream {
    pub fn new(target: PopulationId, params: InputParams, dt: f64, seed: u64) -> Self {
        let kind = match params {
            InputParams::Poisson { rate_hz, c_ext } => InputKind::Poisson {
                p_line: rate_hz * dt * 1e-3,
                c_ext,
                rng: SmallRng::seed_from_u64(seed),
            },
            InputParams::Sine {
                amplitude_pa,
                frequency_hz,
            } => InputKind::Sine {
                amplitude_pa,
                omega: 2.0 * std::f64::consts::PI * frequency_hz * 1e-3,
            },
        };
        Self { target, kind }
    }

    /// Emit this step's exogenous events into the target population.
    ///
    /// Poisson streams mutate the external AMPA gates directly; the returned
    /// value is the deterministic current (pA) to add to the membrane
    /// equation, zero for event streams.
    pub fn drive(&mut self, time_ms: f64, target: &mut Population) -> f64 {
        match &mut self.kind {
            InputKind::Poisson { p_line, c_ext, rng } => {
                for gate in &mut target.s_ampa_ext {
                    let mut hits = 0u32;
                    for _ in 0..*c_ext {
                        if rng.gen::<f64>() < *p_line {
                            hits += 1;
                        }
                    }
                    *gate += f64::from(hits);
                }
                0.0
            }
            InputKind::Sine {
                amplitude_pa,
                omega,
            } => *amplitude_pa * (*omega * time_ms).sin(),
        }
    }
}
