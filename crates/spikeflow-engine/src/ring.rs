// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed-delay calendar queue for in-flight conductance deliveries
//!
//! One ring per projection with a positive transmission delay. Slots are
//! per-step buckets of connection indices; an arrival scheduled for step
//! `t + d` lands in bucket `(t + d) % len` and is drained when the clock
//! reaches that step. Ring length is `delay + 1`, so a bucket is always
//! drained before it can be reused.

pub struct DelayRing {
    buckets: Vec<Vec<u32>>,
    delay_steps: u64,
}

impl DelayRing {
    pub fn new(delay_steps: u64) -> Self {
        let len = delay_steps as usize + 1;
        Self {
            buckets: (0..len).map(|_| Vec::new()).collect(),
            delay_steps,
        }
    }

    pub fn delay_steps(&self) -> u64 {
        self.delay_steps
    }

    /// Schedule a connection's delivery for `emitted_at + delay` steps.
    #[inline]
    pub fn schedule(&mut self, emitted_at: u64, connection: u32) {
        let arrival = emitted_at + self.delay_steps;
        let slot = (arrival % self.buckets.len() as u64) as usize;
        self.buckets[slot].push(connection);
    }

    /// Take every connection arriving at the given step.
    #[inline]
    pub fn drain(&mut self, step: u64) -> Vec<u32> {
        let slot = (step % self.buckets.len() as u64) as usize;
        std::mem::take(&mut self.buckets[slot])
    }
}
