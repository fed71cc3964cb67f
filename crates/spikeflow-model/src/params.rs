// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Immutable per-population and per-projection parameter sets
//!
//! Units follow the usual point-neuron conventions: time in ms, voltage in mV,
//! conductance in nS, capacitance in pF, current in pA. With these choices
//! `g / C` has units of 1/ms and the membrane equation needs no unit scaling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parameter constraint violation, reported at build time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("v_thr ({v_thr}) must be above v_reset ({v_reset})")]
    ThresholdBelowReset { v_thr: f64, v_reset: f64 },
}

/// Physical constants of one neuron type (shared by every neuron in a
/// population).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronParams {
    /// Membrane capacitance (pF)
    pub c_m: f64,
    /// Leak conductance (nS)
    pub g_leak: f64,
    /// Resting potential (mV); also the initial voltage
    pub v_rest: f64,
    /// Firing threshold (mV); spike when v >= v_thr
    pub v_thr: f64,
    /// Post-spike reset potential (mV)
    pub v_reset: f64,
    /// Absolute refractory period (ms)
    pub tau_rp: f64,

    /// AMPA/NMDA reversal potential (mV)
    pub e_ampa: f64,
    /// GABA reversal potential (mV)
    pub e_gaba: f64,

    /// External-drive AMPA conductance scale (nS)
    pub g_ampa_ext: f64,
    /// Recurrent AMPA conductance scale (nS)
    pub g_ampa: f64,
    /// NMDA conductance scale (nS)
    pub g_nmda: f64,
    /// GABA conductance scale (nS)
    pub g_gaba: f64,

    /// AMPA gate decay time constant (ms)
    pub tau_ampa: f64,
    /// GABA gate decay time constant (ms)
    pub tau_gaba: f64,
    /// NMDA rise time constant (ms)
    pub tau_nmda_rise: f64,
    /// NMDA decay time constant (ms)
    pub tau_nmda_decay: f64,
    /// NMDA saturation rate (1/ms)
    pub nmda_alpha: f64,
    /// Extracellular magnesium concentration factor for the NMDA block
    pub mg: f64,

    /// Membrane noise amplitude (mV); 0 disables the noise term
    pub noise_sigma: f64,
}

impl Default for NeuronParams {
    /// Pyramidal-cell constants from the recurrent working-memory model the
    /// engine was validated against.
    fn default() -> Self {
        Self {
            c_m: 500.0,
            g_leak: 25.0,
            v_rest: -70.0,
            v_thr: -50.0,
            v_reset: -60.0,
            tau_rp: 2.0,
            e_ampa: 0.0,
            e_gaba: -70.0,
            g_ampa_ext: 2.08,
            g_ampa: 0.104,
            g_nmda: 0.327,
            g_gaba: 1.25,
            tau_ampa: 2.0,
            tau_gaba: 10.0,
            tau_nmda_rise: 2.0,
            tau_nmda_decay: 100.0,
            nmda_alpha: 0.5,
            mg: 1.0,
            noise_sigma: 0.0,
        }
    }
}

impl NeuronParams {
    /// Interneuron constants from the same source model.
    pub fn interneuron() -> Self {
        Self {
            c_m: 200.0,
            g_leak: 20.0,
            tau_rp: 1.0,
            g_ampa_ext: 1.62,
            g_ampa: 0.081,
            g_nmda: 0.258,
            g_gaba: 0.973,
            ..Self::default()
        }
    }

    /// Membrane time constant C_m / g_leak (ms).
    pub fn tau_m(&self) -> f64 {
        self.c_m / self.g_leak
    }

    /// Collect every constraint violation. Empty means valid.
    pub fn violations(&self) -> Vec<ParamError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("c_m", self.c_m),
            ("g_leak", self.g_leak),
            ("tau_ampa", self.tau_ampa),
            ("tau_gaba", self.tau_gaba),
            ("tau_nmda_rise", self.tau_nmda_rise),
            ("tau_nmda_decay", self.tau_nmda_decay),
        ] {
            if value <= 0.0 {
                errors.push(ParamError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("tau_rp", self.tau_rp),
            ("g_ampa_ext", self.g_ampa_ext),
            ("g_ampa", self.g_ampa),
            ("g_nmda", self.g_nmda),
            ("g_gaba", self.g_gaba),
            ("mg", self.mg),
            ("noise_sigma", self.noise_sigma),
        ] {
            if value < 0.0 {
                errors.push(ParamError::Negative { field, value });
            }
        }
        if self.v_thr <= self.v_reset {
            errors.push(ParamError::ThresholdBelowReset {
                v_thr: self.v_thr,
                v_reset: self.v_reset,
            });
        }
        errors
    }
}

/// Timing-dependent plasticity constants for one projection.
///
/// `a_pre` is added to the presynaptic trace on a pre spike, `a_post`
/// (typically negative) to the postsynaptic trace on a post spike; each trace
/// decays with its own time constant between spikes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdpParams {
    /// Presynaptic trace increment (weight units)
    pub a_pre: f64,
    /// Postsynaptic trace increment (weight units, typically negative)
    pub a_post: f64,
    /// Presynaptic trace time constant (ms)
    pub tau_pre: f64,
    /// Postsynaptic trace time constant (ms)
    pub tau_post: f64,
}

impl Default for StdpParams {
    fn default() -> Self {
        let (a_pre, tau_pre, tau_post) = (0.01, 20.0, 20.0);
        Self {
            a_pre,
            a_post: -a_pre * tau_pre / tau_post * 1.05,
            tau_pre,
            tau_post,
        }
    }
}

impl StdpParams {
    pub fn violations(&self) -> Vec<ParamError> {
        let mut errors = Vec::new();
        for (field, value) in [("tau_pre", self.tau_pre), ("tau_post", self.tau_post)] {
            if value <= 0.0 {
                errors.push(ParamError::NonPositive { field, value });
            }
        }
        errors
    }
}

/// Exogenous drive applied to one population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputParams {
    /// `c_ext` independent Poisson lines per neuron, each at `rate_hz`.
    /// Every line spike increments the external AMPA gate by one.
    Poisson { rate_hz: f64, c_ext: u32 },
    /// Deterministic current `A * sin(2*pi*f*t)` injected into every neuron.
    Sine { amplitude_pa: f64, frequency_hz: f64 },
}

impl InputParams {
    pub fn violations(&self) -> Vec<ParamError> {
        let mut errors = Vec::new();
        match *self {
            InputParams::Poisson { rate_hz, c_ext } => {
                if rate_hz < 0.0 {
                    errors.push(ParamError::Negative {
                        field: "rate_hz",
                        value: rate_hz,
                    });
                }
                if c_ext == 0 {
                    errors.push(ParamError::NonPositive {
                        field: "c_ext",
                        value: 0.0,
                    });
                }
            }
            InputParams::Sine { frequency_hz, .. } => {
                if frequency_hz < 0.0 {
                    errors.push(ParamError::Negative {
                        field: "frequency_hz",
                        value: frequency_hz,
                    });
                }
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(NeuronParams::default().violations().is_empty());
        assert!(NeuronParams::interneuron().violations().is_empty());
        assert!(StdpParams::default().violations().is_empty());
    }

    #[test]
    fn test_membrane_time_constant() {
        let params = NeuronParams::default();
        assert!((params.tau_m() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_capacitance_rejected() {
        let params = NeuronParams {
            c_m: 0.0,
            ..NeuronParams::default()
        };
        let errors = params.violations();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::NonPositive { field: "c_m", .. })));
    }

    #[test]
    fn test_threshold_must_exceed_reset() {
        let params = NeuronParams {
            v_thr: -70.0,
            v_reset: -60.0,
            ..NeuronParams::default()
        };
        assert!(params
            .violations()
            .iter()
            .any(|e| matches!(e, ParamError::ThresholdBelowReset { .. })));
    }

    #[test]
    fn test_poisson_input_requires_lines() {
        let input = InputParams::Poisson {
            rate_hz: 3.0,
            c_ext: 0,
        };
        assert!(!input.violations().is_empty());
    }

    #[test]
    fn test_default_stdp_ratio() {
        let stdp = StdpParams::default();
        // Depression slightly outweighs potentiation at equal time constants.
        assert!((stdp.a_post / stdp.a_pre + 1.05).abs() < 1e-12);
    }
}
