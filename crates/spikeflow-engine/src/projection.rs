// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Synapse Projection
//!
//! Sparse per-connection state between a source and a target population,
//! stored as parallel vectors with a prebuilt source-neuron index for
//! delivery and (when plastic) a target-neuron index for the post-side rule.
//!
//! Ordering contract per step: all pre-side effects (conductance quantum or
//! ring scheduling, presynaptic trace bump, weight += apost) run before any
//! post-side effect (postsynaptic trace bump, weight += apre). When a
//! connection's two endpoints spike in the same step, the pre-side update
//! therefore reads the postsynaptic trace without this step's increment,
//! while the post-side update reads the presynaptic trace including it.
//! Plasticity is order-sensitive; tests pin this down.

use ahash::AHashMap;
use spikeflow_model::{decay_factor, ChannelKind, NeuronParams, PopulationId, StdpParams};

use crate::population::Population;
use crate::ring::DelayRing;
use crate::wiring::ConnectivitySummary;

/// Per-connection plasticity traces and their exact decay factors.
struct StdpState {
    params: StdpParams,
    apre: Vec<f64>,
    apost: Vec<f64>,
    f_pre: f64,
    f_post: f64,
}

pub struct Projection {
    pub name: String,
    pub source: PopulationId,
    pub target: PopulationId,
    pub kind: ChannelKind,

    /// Parallel connection vectors; `(pre[i], post[i])` is unique.
    pre: Vec<u32>,
    post: Vec<u32>,
    w: Vec<f64>,
    w_max: f64,

    /// NMDA per-connection rise and saturation state (empty for other kinds)
    nmda_x: Vec<f64>,
    nmda_s: Vec<f64>,
    f_nmda_rise: f64,
    nmda_alpha: f64,
    tau_nmda_decay: f64,

    stdp: Option<StdpState>,

    /// Source neuron -> indices of its outgoing connections
    outgoing: AHashMap<u32, Vec<u32>>,
    /// Target neuron -> indices of its incoming connections (plastic only)
    incoming: AHashMap<u32, Vec<u32>>,

    /// Delay ring for positive transmission delays; `None` means zero delay
    ring: Option<DelayRing>,

    summary: ConnectivitySummary,
    dt: f64,
}

impl Projection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        source: PopulationId,
        target: PopulationId,
        kind: ChannelKind,
        pre: Vec<u32>,
        post: Vec<u32>,
        w: Vec<f64>,
        w_max: f64,
        delay_steps: u64,
        dt: f64,
        target_params: &NeuronParams,
        stdp: Option<StdpParams>,
        n_pre: usize,
        n_post: usize,
    ) -> Self {
        let name = name.into();
        debug_assert_eq!(pre.len(), post.len());
        debug_assert_eq!(pre.len(), w.len());

        let mut outgoing: AHashMap<u32, Vec<u32>> = AHashMap::new();
        for (ci, &src) in pre.iter().enumerate() {
            outgoing.entry(src).or_default().push(ci as u32);
        }
        let mut incoming: AHashMap<u32, Vec<u32>> = AHashMap::new();
        if stdp.is_some() {
            for (ci, &dst) in post.iter().enumerate() {
                incoming.entry(dst).or_default().push(ci as u32);
            }
        }

        let n = pre.len();
        let (nmda_x, nmda_s) = if kind == ChannelKind::Nmda {
            (vec![0.0; n], vec![0.0; n])
        } else {
            (Vec::new(), Vec::new())
        };

        let summary = ConnectivitySummary::from_edges(name.clone(), n_pre, n_post, &pre, &post);

        Self {
            name,
            source,
            target,
            kind,
            pre,
            post,
            w,
            w_max,
            nmda_x,
            nmda_s,
            f_nmda_rise: decay_factor(dt, target_params.tau_nmda_rise),
            nmda_alpha: target_params.nmda_alpha,
            tau_nmda_decay: target_params.tau_nmda_decay,
            stdp: stdp.map(|params| StdpState {
                apre: vec![0.0; n],
                apost: vec![0.0; n],
                f_pre: decay_factor(dt, params.tau_pre),
                f_post: decay_factor(dt, params.tau_post),
                params,
            }),
            outgoing,
            incoming,
            ring: (delay_steps > 0).then(|| DelayRing::new(delay_steps)),
            summary,
            dt,
        }
    }

    pub fn len(&self) -> usize {
        self.pre.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.w
    }

    pub fn summary(&self) -> &ConnectivitySummary {
        &self.summary
    }

    pub fn is_plastic(&self) -> bool {
        self.stdp.is_some()
    }

    /// The conductance quantum of one connection arriving at the target.
    /// Uses the weight value at arrival time.
    #[inline]
    fn apply_quantum(
        kind: ChannelKind,
        ci: usize,
        post: &[u32],
        w: &[f64],
        nmda_x: &mut [f64],
        target: &mut Population,
    ) {
        match kind {
            ChannelKind::Ampa => target.s_ampa[post[ci] as usize] += w[ci],
            ChannelKind::Gaba => target.s_gaba[post[ci] as usize] += 1.0,
            ChannelKind::Nmda => nmda_x[ci] += 1.0,
            ChannelKind::Delta => target.kick(post[ci], w[ci]),
        }
    }

    /// Phase (a): apply every queued delivery whose arrival step is `step`.
    pub fn deliver_due(&mut self, step: u64, target: &mut Population) {
        let Self {
            ring,
            kind,
            post,
            w,
            nmda_x,
            ..
        } = self;
        if let Some(ring) = ring {
            for ci in ring.drain(step) {
                Self::apply_quantum(*kind, ci as usize, post, w, nmda_x, target);
            }
        }
    }

    /// Phase (e), pre side: for every source spike emitted this step, apply
    /// the immediate conductance effect (or schedule it into the delay ring)
    /// and, for plastic projections, the presynaptic trace/weight update.
    ///
    /// Trace and weight updates always happen at the emission step; only the
    /// conductance quantum travels through the ring.
    pub fn on_pre_spikes(&mut self, spikes: &[u32], step: u64, target: &mut Population) {
        let Self {
            outgoing,
            ring,
            kind,
            post,
            w,
            w_max,
            nmda_x,
            stdp,
            ..
        } = self;
        for &src in spikes {
            let Some(conns) = outgoing.get(&src) else {
                continue;
            };
            for &ci in conns {
                let ci = ci as usize;
                match ring {
                    Some(ring) => ring.schedule(step, ci as u32),
                    None => Self::apply_quantum(*kind, ci, post, w, nmda_x, target),
                }
                if let Some(stdp) = stdp {
                    stdp.apre[ci] += stdp.params.a_pre;
                    w[ci] = (w[ci] + stdp.apost[ci]).clamp(0.0, *w_max);
                }
            }
        }
    }

    /// Phase (e), post side: postsynaptic trace/weight update for every
    /// target spike emitted this step. No-op for non-plastic projections.
    pub fn on_post_spikes(&mut self, spikes: &[u32]) {
        let Self {
            incoming,
            w,
            w_max,
            stdp,
            ..
        } = self;
        let Some(stdp) = stdp else {
            return;
        };
        for &dst in spikes {
            let Some(conns) = incoming.get(&dst) else {
                continue;
            };
            for &ci in conns {
                let ci = ci as usize;
                stdp.apost[ci] += stdp.params.a_post;
                w[ci] = (w[ci] + stdp.apre[ci]).clamp(0.0, *w_max);
            }
        }
    }

    /// Phase (f): one step of trace decay. Plasticity traces and the NMDA
    /// rise variable decay exactly; the NMDA saturation state integrates its
    /// nonlinear term with forward Euler.
    ///
    /// Returns the index of the first non-finite connection state, if any.
    pub fn decay_traces(&mut self) -> Option<usize> {
        let mut diverged = None;
        if let Some(stdp) = &mut self.stdp {
            for a in &mut stdp.apre {
                *a *= stdp.f_pre;
            }
            for a in &mut stdp.apost {
                *a *= stdp.f_post;
            }
        }
        if self.kind == ChannelKind::Nmda {
            let dt = self.dt;
            let alpha = self.nmda_alpha;
            let tau_decay = self.tau_nmda_decay;
            for ci in 0..self.nmda_s.len() {
                let s = self.nmda_s[ci];
                let x = self.nmda_x[ci];
                let s_next = s + dt * (-s / tau_decay + alpha * x * (1.0 - s));
                self.nmda_s[ci] = s_next;
                self.nmda_x[ci] = x * self.f_nmda_rise;
                if !s_next.is_finite() && diverged.is_none() {
                    diverged = Some(ci);
                }
            }
        }
        diverged
    }

    /// Many-to-one reduction `s_nmda_tot[post] += sum(w * s)` into the target
    /// population. The caller zeroes the accumulators once per step before
    /// any projection adds to them.
    pub fn accumulate_nmda(&self, target: &mut Population) {
        if self.kind != ChannelKind::Nmda {
            return;
        }
        for ci in 0..self.nmda_s.len() {
            target.s_nmda_tot[self.post[ci] as usize] += self.w[ci] * self.nmda_s[ci];
        }
    }
}
