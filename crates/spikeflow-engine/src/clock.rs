// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulation clock
//!
//! Time is an integer step count over a fixed increment `dt`; the clock is
//! the engine's sole source of "now". Nothing in the engine branches on wall
//! clock time.

use crate::error::{BuildError, BuildResult};

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    dt: f64,
    step: u64,
    n_steps: u64,
}

impl Clock {
    pub fn new(dt: f64, duration_ms: f64) -> BuildResult<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(BuildError::InvalidTimeStep(dt));
        }
        if duration_ms < 0.0 || !duration_ms.is_finite() {
            return Err(BuildError::InvalidDuration(duration_ms));
        }
        Ok(Self {
            dt,
            step: 0,
            n_steps: (duration_ms / dt).ceil() as u64,
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Current step index.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Total steps in the run, `ceil(duration / dt)`.
    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    /// Clock time of the current step (ms).
    pub fn time(&self) -> f64 {
        self.step as f64 * self.dt
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.n_steps
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }
}
