// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Connectivity Construction
//!
//! Realizes a projection's edge set once at build time from its configured
//! policy and seeded RNG. The realized set is fixed for the run; duplicates
//! are impossible by construction (each ordered pair is visited once).
//!
//! Degenerate outcomes (zero edges, isolated endpoints) are not errors: they
//! are recorded in a [`ConnectivitySummary`] and logged as warnings.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Edge-set construction policy, evaluated once per projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ConnectivityPolicy {
    /// Every ordered pair. `self_loops` only matters for self-projections.
    AllToAll { self_loops: bool },
    /// Independent Bernoulli trial with probability `p` per ordered pair.
    Bernoulli { p: f64, self_loops: bool },
}

/// Initial weight assignment for realized edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "init", rename_all = "snake_case")]
pub enum WeightInit {
    Constant { value: f64 },
    /// Uniform in `[0, w_max)`, drawn from the projection's seeded stream.
    Uniform,
}

/// Realize the edge set as parallel `(pre, post)` vectors.
///
/// `recurrent` marks a self-projection (source and target populations
/// coincide); only then does the self-loop flag apply.
pub fn realize_edges(
    policy: ConnectivityPolicy,
    n_pre: usize,
    n_post: usize,
    recurrent: bool,
    rng: &mut SmallRng,
) -> (Vec<u32>, Vec<u32>) {
    let mut pre = Vec::new();
    let mut post = Vec::new();
    for i in 0..n_pre as u32 {
        for j in 0..n_post as u32 {
            let keep = match policy {
                ConnectivityPolicy::AllToAll { self_loops } => {
                    self_loops || !recurrent || i != j
                }
                ConnectivityPolicy::Bernoulli { p, self_loops } => {
                    (self_loops || !recurrent || i != j) && rng.gen::<f64>() < p
                }
            };
            if keep {
                pre.push(i);
                post.push(j);
            }
        }
    }
    (pre, post)
}

/// Assign initial weights for `n` edges, clamped into `[0, w_max]`.
pub fn init_weights(init: WeightInit, n: usize, w_max: f64, rng: &mut SmallRng) -> Vec<f64> {
    match init {
        WeightInit::Constant { value } => vec![value.clamp(0.0, w_max); n],
        WeightInit::Uniform => (0..n).map(|_| rng.gen::<f64>() * w_max).collect(),
    }
}

/// Post-build statistics for one projection's realized edge set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivitySummary {
    pub projection: String,
    pub edges: usize,
    /// Source neurons with no outgoing edge in this projection
    pub silent_sources: usize,
    /// Target neurons with no incoming edge in this projection
    pub silent_targets: usize,
}

impl ConnectivitySummary {
    pub fn from_edges(
        projection: impl Into<String>,
        n_pre: usize,
        n_post: usize,
        pre: &[u32],
        post: &[u32],
    ) -> Self {
        let mut has_out = vec![false; n_pre];
        let mut has_in = vec![false; n_post];
        for &i in pre {
            has_out[i as usize] = true;
        }
        for &j in post {
            has_in[j as usize] = true;
        }
        let summary = Self {
            projection: projection.into(),
            edges: pre.len(),
            silent_sources: has_out.iter().filter(|&&x| !x).count(),
            silent_targets: has_in.iter().filter(|&&x| !x).count(),
        };
        if summary.edges == 0 {
            warn!(
                projection = %summary.projection,
                "projection realized zero edges"
            );
        } else if summary.silent_sources > 0 || summary.silent_targets > 0 {
            warn!(
                projection = %summary.projection,
                silent_sources = summary.silent_sources,
                silent_targets = summary.silent_targets,
                "projection has isolated neurons"
            );
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_all_to_all_excludes_self_loops_when_recurrent() {
        let mut rng = SmallRng::seed_from_u64(1);
        let (pre, post) = realize_edges(
            ConnectivityPolicy::AllToAll { self_loops: false },
            4,
            4,
            true,
            &mut rng,
        );
        assert_eq!(pre.len(), 12);
        assert!(pre.iter().zip(&post).all(|(i, j)| i != j));
    }

    #[test]
    fn test_all_to_all_keeps_self_loops_when_asked() {
        let mut rng = SmallRng::seed_from_u64(1);
        let (pre, _) = realize_edges(
            ConnectivityPolicy::AllToAll { self_loops: true },
            4,
            4,
            true,
            &mut rng,
        );
        assert_eq!(pre.len(), 16);
    }

    #[test]
    fn test_self_loop_flag_ignored_for_distinct_populations() {
        let mut rng = SmallRng::seed_from_u64(1);
        let (pre, _) = realize_edges(
            ConnectivityPolicy::AllToAll { self_loops: false },
            3,
            3,
            false,
            &mut rng,
        );
        // Distinct populations: index equality is not a self-loop.
        assert_eq!(pre.len(), 9);
    }

    #[test]
    fn test_bernoulli_is_seeded_and_within_bounds() {
        let (pre_a, post_a) = realize_edges(
            ConnectivityPolicy::Bernoulli {
                p: 0.25,
                self_loops: true,
            },
            50,
            50,
            false,
            &mut SmallRng::seed_from_u64(33),
        );
        let (pre_b, post_b) = realize_edges(
            ConnectivityPolicy::Bernoulli {
                p: 0.25,
                self_loops: true,
            },
            50,
            50,
            false,
            &mut SmallRng::seed_from_u64(33),
        );
        assert_eq!(pre_a, pre_b);
        assert_eq!(post_a, post_b);
        // Loose statistical check around p * n^2 = 625.
        assert!(pre_a.len() > 450 && pre_a.len() < 800);
    }

    #[test]
    fn test_uniform_weights_respect_bound() {
        let mut rng = SmallRng::seed_from_u64(5);
        let w = init_weights(WeightInit::Uniform, 1000, 2.5, &mut rng);
        assert!(w.iter().all(|&x| (0.0..=2.5).contains(&x)));
    }

    #[test]
    fn test_summary_counts_isolated_neurons() {
        let pre = vec![0, 0, 1];
        let post = vec![1, 2, 1];
        let summary = ConnectivitySummary::from_edges("test", 3, 3, &pre, &post);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.silent_sources, 1); // neuron 2
        assert_eq!(summary.silent_targets, 1); // neuron 0
    }
}
