// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Neuron Population
//!
//! Structure-of-arrays storage for one population's continuous state, with
//! the per-step integrate / detect / reset contract.
//!
//! Integration is computed in parallel (read-only) and applied sequentially,
//! so a spike can never influence another neuron's detection within the same
//! step. Refractory neurons are excluded from integration: their voltage is
//! pinned at the reset value and only the countdown is decremented.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use spikeflow_model::channel::{membrane_step, synaptic_current};
use spikeflow_model::{decay_factor, NeuronParams, PopulationId};

/// Seeded Gaussian stream for the optional membrane noise term.
///
/// Marsaglia polar sampling over the uniform source; one spare is cached
/// between draws so consecutive samples stay cheap.
struct NoiseStream {
    rng: SmallRng,
    spare: Option<f64>,
}

impl NoiseStream {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            spare: None,
        }
    }

    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        loop {
            let u: f64 = self.rng.gen_range(-1.0..1.0);
            let v: f64 = self.rng.gen_range(-1.0..1.0);
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * factor);
                return u * factor;
            }
        }
    }
}

/// One population's state: parallel vectors, one slot per neuron.
///
/// Structure is fixed at build time; only the state fields mutate during a
/// run.
pub struct Population {
    pub id: PopulationId,
    pub name: String,
    pub params: NeuronParams,

    /// Membrane potentials (mV)
    pub v: Vec<f64>,
    /// External-drive AMPA gates
    pub s_ampa_ext: Vec<f64>,
    /// Recurrent AMPA gates
    pub s_ampa: Vec<f64>,
    /// GABA gates
    pub s_gaba: Vec<f64>,
    /// Per-neuron NMDA totals, recomputed each step by the projections'
    /// many-to-one reduction
    pub s_nmda_tot: Vec<f64>,
    /// Refractory countdowns (steps); voltage is pinned while > 0
    pub refractory: Vec<u32>,

    /// Refractory duration in whole steps, `round(tau_rp / dt)`
    refractory_steps: u32,
    /// Exact per-step decay factors, precomputed at build
    f_ampa: f64,
    f_gaba: f64,
    /// Noise amplitude per step, `sigma * sqrt(dt / tau_m)`; 0 disables
    noise_amplitude: f64,
    noise: Option<NoiseStream>,
}

impl Population {
    pub fn new(
        id: PopulationId,
        name: impl Into<String>,
        size: usize,
        params: NeuronParams,
        dt: f64,
        noise_seed: u64,
    ) -> Self {
        let noise_amplitude = if params.noise_sigma > 0.0 {
            params.noise_sigma * (dt / params.tau_m()).sqrt()
        } else {
            0.0
        };
        Self {
            id,
            name: name.into(),
            v: vec![params.v_rest; size],
            s_ampa_ext: vec![0.0; size],
            s_ampa: vec![0.0; size],
            s_gaba: vec![0.0; size],
            s_nmda_tot: vec![0.0; size],
            refractory: vec![0; size],
            refractory_steps: (params.tau_rp / dt).round() as u32,
            f_ampa: decay_factor(dt, params.tau_ampa),
            f_gaba: decay_factor(dt, params.tau_gaba),
            noise_amplitude,
            noise: (params.noise_sigma > 0.0).then(|| NoiseStream::new(noise_seed)),
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    /// One Euler step for every non-refractory neuron, using the gate values
    /// accumulated through the end of the previous step. `i_ext` is the
    /// deterministic external current (pA) for this step, shared by the whole
    /// population.
    ///
    /// Returns the index of the first neuron whose voltage went non-finite,
    /// if any; the caller turns that into a fatal divergence error.
    pub fn integrate(&mut self, dt: f64, i_ext: f64) -> Option<u32> {
        // Noise is drawn sequentially in index order so runs are reproducible
        // regardless of the parallel chunking below.
        let noise: Vec<f64> = match self.noise.as_mut() {
            Some(stream) => {
                let amp = self.noise_amplitude;
                (0..self.v.len())
                    .map(|_| amp * stream.standard_normal())
                    .collect()
            }
            None => Vec::new(),
        };

        let params = self.params;
        // Phase 1: compute in parallel (read-only).
        let updates: Vec<(f64, u32)> = (0..self.v.len())
            .into_par_iter()
            .map(|i| {
                let countdown = self.refractory[i];
                if countdown > 0 {
                    return (params.v_reset, countdown - 1);
                }
                let i_syn = synaptic_current(
                    &params,
                    self.v[i],
                    self.s_ampa_ext[i],
                    self.s_ampa[i],
                    self.s_nmda_tot[i],
                    self.s_gaba[i],
                );
                let mut v_next = membrane_step(&params, self.v[i], i_syn, i_ext, dt);
                if !noise.is_empty() {
                    v_next += noise[i];
                }
                (v_next, 0)
            })
            .collect();

        // Phase 2: apply sequentially.
        let mut diverged = None;
        for (i, (v_next, countdown)) in updates.into_iter().enumerate() {
            if !v_next.is_finite() && diverged.is_none() {
                diverged = Some(i as u32);
            }
            self.v[i] = v_next;
            self.refractory[i] = countdown;
        }
        diverged
    }

    /// Neurons at or above threshold after integration. Runs over the whole
    /// population before any reset is applied, so simultaneous spikes cannot
    /// suppress each other.
    pub fn detect_spikes(&self) -> Vec<u32> {
        let params = &self.params;
        self.v
            .iter()
            .zip(&self.refractory)
            .enumerate()
            .filter(|&(_, (&v, &countdown))| countdown == 0 && v >= params.v_thr)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Reset voltage and start the refractory countdown for every detected
    /// spike. Strictly after the full detection scan.
    pub fn apply_resets(&mut self, spikes: &[u32]) {
        for &i in spikes {
            self.v[i as usize] = self.params.v_reset;
            self.refractory[i as usize] = self.refractory_steps;
        }
    }

    /// Exact exponential decay of the per-neuron channel gates by one step.
    pub fn decay_gates(&mut self) {
        for s in &mut self.s_ampa_ext {
            *s *= self.f_ampa;
        }
        for s in &mut self.s_ampa {
            *s *= self.f_ampa;
        }
        for s in &mut self.s_gaba {
            *s *= self.f_gaba;
        }
    }

    /// Direct membrane kick from a delta-channel delivery. Refractory targets
    /// keep their pinned voltage.
    pub fn kick(&mut self, neuron: u32, w: f64) {
        if self.refractory[neuron as usize] == 0 {
            self.v[neuron as usize] += w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_population(size: usize, dt: f64) -> Population {
        Population::new(
            PopulationId(0),
            "test",
            size,
            NeuronParams::default(),
            dt,
            7,
        )
    }

    #[test]
    fn test_passive_decay_toward_rest() {
        let dt = 0.01;
        let mut pop = quiet_population(1, dt);
        pop.v[0] = -55.0;

        // One membrane time constant of quiet integration.
        let steps = (pop.params.tau_m() / dt).round() as usize;
        for _ in 0..steps {
            assert!(pop.integrate(dt, 0.0).is_none());
        }

        // v(t) = v_rest + (v0 - v_rest) * exp(-t/tau), within Euler error.
        let expected = pop.params.v_rest + 15.0 * (-1.0f64).exp();
        assert!((pop.v[0] - expected).abs() < 0.05);
    }

    #[test]
    fn test_refractory_neuron_is_pinned() {
        let dt = 0.1;
        let mut pop = quiet_population(1, dt);
        pop.v[0] = -40.0;

        let spikes = pop.detect_spikes();
        assert_eq!(spikes, vec![0]);
        pop.apply_resets(&spikes);

        // tau_rp = 2 ms -> 20 steps of pinning even under strong drive.
        for _ in 0..20 {
            assert!(pop.integrate(dt, 500.0).is_none());
            assert_eq!(pop.v[0], pop.params.v_reset);
            assert!(pop.detect_spikes().is_empty());
        }
        // Countdown exhausted: integration resumes.
        assert_eq!(pop.refractory[0], 0);
        pop.integrate(dt, 500.0);
        assert!(pop.v[0] > pop.params.v_reset);
    }

    #[test]
    fn test_detection_scans_whole_population_before_reset() {
        let dt = 0.1;
        let mut pop = quiet_population(3, dt);
        pop.v = vec![-45.0, -60.0, -45.0];

        let spikes = pop.detect_spikes();
        assert_eq!(spikes, vec![0, 2]);
        pop.apply_resets(&spikes);
        assert_eq!(pop.v[0], pop.params.v_reset);
        assert_eq!(pop.v[2], pop.params.v_reset);
        assert_eq!(pop.v[1], -60.0);
    }

    #[test]
    fn test_gate_decay_is_exact() {
        let dt = 0.5;
        let mut pop = quiet_population(1, dt);
        pop.s_gaba[0] = 1.0;
        pop.decay_gates();
        let expected = (-dt / pop.params.tau_gaba).exp();
        assert!((pop.s_gaba[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn test_noise_streams_are_reproducible() {
        let params = NeuronParams {
            noise_sigma: 5.0,
            ..NeuronParams::default()
        };
        let mut a = Population::new(PopulationId(0), "a", 16, params, 0.1, 99);
        let mut b = Population::new(PopulationId(0), "b", 16, params, 0.1, 99);
        for _ in 0..50 {
            a.integrate(0.1, 0.0);
            b.integrate(0.1, 0.0);
        }
        assert_eq!(a.v, b.v);
    }

    #[test]
    fn test_kick_skips_refractory_target() {
        let dt = 0.1;
        let mut pop = quiet_population(1, dt);
        pop.apply_resets(&[0]);
        let pinned = pop.v[0];
        pop.kick(0, 10.0);
        assert_eq!(pop.v[0], pinned);
        pop.refractory[0] = 0;
        pop.kick(0, 10.0);
        assert_eq!(pop.v[0], pinned + 10.0);
    }
}
