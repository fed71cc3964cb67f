// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end checks of the stepping loop: spike causality across the
//! integrate/deliver barrier, refractory enforcement under sustained drive,
//! the sign structure of pair-based plasticity, numerical divergence
//! reporting, and bitwise run-to-run determinism.

use std::sync::Arc;

use parking_lot::Mutex;
use spikeflow_engine::{
    Clock, ConnectivityPolicy, InputStream, MemoryRecorder, ObservationSink, Population,
    Projection, RecordingConfig, Simulation, SimulationError, WeightInit,
};
use spikeflow_model::{ChannelKind, InputParams, NeuronParams, PopulationId, StdpParams};

const DT: f64 = 0.1;

fn population(id: u32, name: &str, size: usize, params: NeuronParams) -> Population {
    Population::new(PopulationId(id), name, size, params, DT, 1000 + u64::from(id))
}

fn one_to_one(
    name: &str,
    source: u32,
    target: u32,
    kind: ChannelKind,
    w: f64,
    w_max: f64,
    stdp: Option<StdpParams>,
) -> Projection {
    Projection::new(
        name,
        PopulationId(source),
        PopulationId(target),
        kind,
        vec![0],
        vec![0],
        vec![w],
        w_max,
        0,
        DT,
        &NeuronParams::default(),
        stdp,
        1,
        1,
    )
}

fn shared_recorder() -> (Arc<Mutex<MemoryRecorder>>, Box<dyn ObservationSink>) {
    let recorder = Arc::new(Mutex::new(MemoryRecorder::new()));
    (recorder.clone(), Box::new(recorder))
}

#[test]
fn test_zero_delay_spike_is_visible_one_step_later() {
    // A starts above threshold and fires on step 0. Its delta kick lands on
    // B after B's own integration and detection, so B can fire no earlier
    // than step 1 even though the connection has zero delay.
    let mut a = population(0, "a", 1, NeuronParams::default());
    a.v[0] = -40.0;
    let b = population(1, "b", 1, NeuronParams::default());

    // Kick large enough to lift B from rest across threshold in one step.
    let proj = one_to_one("a_to_b", 0, 1, ChannelKind::Delta, 30.0, 100.0, None);

    let (recorder, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(DT, 1.0).unwrap(),
        vec![a, b],
        vec![proj],
        Vec::new(),
        RecordingConfig::default(),
        sink,
    );
    sim.run().unwrap();

    let rec = recorder.lock();
    assert_eq!(rec.spike_times(PopulationId(0), 0), vec![0.0]);
    assert_eq!(rec.spike_times(PopulationId(1), 0), vec![DT]);
}

#[test]
fn test_refractory_period_bounds_firing_rate() {
    // Saturating sinusoidal drive: during the positive half-cycle the neuron
    // would fire every step if the refractory clamp did not hold it back.
    let pop = population(0, "driven", 1, NeuronParams::default());
    let input = InputStream::new(
        PopulationId(0),
        InputParams::Sine {
            amplitude_pa: 50_000.0,
            frequency_hz: 10.0, // 100 ms period, positive for the first 50 ms
        },
        DT,
        0,
    );

    let (recorder, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(DT, 40.0).unwrap(),
        vec![pop],
        Vec::new(),
        vec![input],
        RecordingConfig::default(),
        sink,
    );
    sim.run().unwrap();

    let times = recorder.lock().spike_times(PopulationId(0), 0);
    assert!(times.len() > 5, "drive too weak, got {} spikes", times.len());
    for pair in times.windows(2) {
        let isi = pair[1] - pair[0];
        // tau_rp = 2 ms of pinning plus the step that crosses threshold.
        assert!(isi > 2.0 - 1e-9, "inter-spike interval {isi} below tau_rp");
    }
}

#[test]
fn test_pre_before_post_potentiates_and_reverse_depresses() {
    // A fires at step 0 and drives B to fire at step 1 through a strong
    // non-plastic connection. Two plastic probes watch the pair:
    //   a_to_b sees pre (step 0) then post (step 1)  -> potentiation
    //   b_to_a sees post (step 0) then pre (step 1)  -> depression
    let mut a = population(0, "a", 1, NeuronParams::default());
    a.v[0] = -40.0;
    let b = population(1, "b", 1, NeuronParams::default());

    let stdp = StdpParams::default();
    let driver = one_to_one("driver", 0, 1, ChannelKind::Delta, 30.0, 100.0, None);
    let forward = one_to_one("a_to_b", 0, 1, ChannelKind::Delta, 0.001, 10.0, Some(stdp));
    let backward = one_to_one("b_to_a", 1, 0, ChannelKind::Delta, 1.0, 10.0, Some(stdp));

    let (_, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(DT, 0.5).unwrap(),
        vec![a, b],
        vec![driver, forward, backward],
        Vec::new(),
        RecordingConfig::default(),
        sink,
    );
    sim.run().unwrap();

    let forward_w = sim.projections()[1].weights()[0];
    let backward_w = sim.projections()[2].weights()[0];
    assert!(forward_w > 0.001, "pre-then-post must potentiate: {forward_w}");
    assert!(backward_w < 1.0, "post-then-pre must depress: {backward_w}");
}

#[test]
fn test_divergence_aborts_with_location() {
    // dt far beyond the stability limit of the explicit update: the voltage
    // deviation grows geometrically until it leaves f64 range. The threshold
    // is pushed out of reach so the spike reset cannot mask the blow-up.
    let params = NeuronParams {
        v_thr: f64::INFINITY,
        ..NeuronParams::default()
    };
    let mut pop = population(0, "unstable", 2, params);
    pop.v[1] = -60.0;

    let (_, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(1000.0, 1e6).unwrap(),
        vec![pop],
        Vec::new(),
        Vec::new(),
        RecordingConfig::default(),
        sink,
    );

    match sim.run() {
        Err(SimulationError::DivergedVoltage {
            population, neuron, ..
        }) => {
            assert_eq!(population, PopulationId(0));
            // Neuron 0 sits exactly at rest and never moves.
            assert_eq!(neuron, 1);
        }
        other => panic!("expected divergence, got {other:?}"),
    }
}

fn build_noisy_network(recorder: Arc<Mutex<MemoryRecorder>>) -> Simulation {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use spikeflow_engine::wiring::{init_weights, realize_edges};

    let exc_params = NeuronParams {
        noise_sigma: 0.5,
        ..NeuronParams::default()
    };
    let exc = Population::new(PopulationId(0), "exc", 40, exc_params, DT, 1);
    let inh = Population::new(PopulationId(1), "inh", 10, NeuronParams::interneuron(), DT, 2);

    let policy = ConnectivityPolicy::Bernoulli {
        p: 0.2,
        self_loops: false,
    };
    let mut wiring_rng = SmallRng::seed_from_u64(3);
    let (pre, post) = realize_edges(policy, 40, 10, false, &mut wiring_rng);
    let mut weight_rng = SmallRng::seed_from_u64(4);
    let w = init_weights(WeightInit::Uniform, pre.len(), 0.4, &mut weight_rng);

    let proj = Projection::new(
        "exc_to_inh",
        PopulationId(0),
        PopulationId(1),
        ChannelKind::Ampa,
        pre,
        post,
        w,
        0.4,
        5,
        DT,
        &NeuronParams::interneuron(),
        Some(StdpParams::default()),
        40,
        10,
    );

    let input = InputStream::new(
        PopulationId(0),
        InputParams::Poisson {
            rate_hz: 3.0,
            c_ext: 800,
        },
        DT,
        5,
    );

    Simulation::new(
        Clock::new(DT, 100.0).unwrap(),
        vec![exc, inh],
        vec![proj],
        vec![input],
        RecordingConfig::default(),
        Box::new(recorder),
    )
}

#[test]
fn test_identical_seeds_give_identical_runs() {
    // Poisson drive, membrane noise, random wiring, delays and plasticity
    // all active: the only entropy sources are the fixed seeds.
    let rec_a = Arc::new(Mutex::new(MemoryRecorder::new()));
    let rec_b = Arc::new(Mutex::new(MemoryRecorder::new()));
    let mut sim_a = build_noisy_network(rec_a.clone());
    let mut sim_b = build_noisy_network(rec_b.clone());

    let report_a = sim_a.run().unwrap();
    let report_b = sim_b.run().unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(rec_a.lock().spikes, rec_b.lock().spikes);
    assert_eq!(
        sim_a.projections()[0].weights(),
        sim_b.projections()[0].weights()
    );
    assert_eq!(sim_a.populations()[0].v, sim_b.populations()[0].v);
}

#[test]
fn test_rate_bins_partition_all_spikes() {
    let mut pop = population(0, "a", 1, NeuronParams::default());
    pop.v[0] = -40.0;
    let input = InputStream::new(
        PopulationId(0),
        InputParams::Poisson {
            rate_hz: 5.0,
            c_ext: 1200,
        },
        DT,
        9,
    );

    let (recorder, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(DT, 25.0).unwrap(),
        vec![pop],
        Vec::new(),
        vec![input],
        RecordingConfig {
            sample_every: 0,
            variables: Vec::new(),
            rate_bin: 100, // 10 ms bins over a 25 ms run: trailing partial bin
        },
        sink,
    );
    let report = sim.run().unwrap();

    let rec = recorder.lock();
    let binned: u64 = rec.rate_bins.iter().map(|(_, _, _, count)| count).sum();
    assert_eq!(binned, report.total_spikes);
    assert_eq!(rec.rate_bins.len(), 3);
    let (_, t_start, t_end, _) = rec.rate_bins[2];
    assert!((t_start - 20.0).abs() < 1e-9);
    assert!((t_end - 25.0).abs() < 1e-9);
}

#[test]
fn test_snapshots_observe_requested_variables() {
    let pop = population(0, "a", 3, NeuronParams::default());
    let (recorder, sink) = shared_recorder();
    let mut sim = Simulation::new(
        Clock::new(DT, 1.0).unwrap(),
        vec![pop],
        Vec::new(),
        Vec::new(),
        RecordingConfig {
            sample_every: 5,
            variables: vec![spikeflow_engine::RecordVariable::V],
            rate_bin: 0,
        },
        sink,
    );
    sim.run().unwrap();

    let rec = recorder.lock();
    // Steps 0 and 5 out of 10.
    assert_eq!(rec.snapshots.len(), 2);
    for (_, variable, _, values) in &rec.snapshots {
        assert_eq!(*variable, "v");
        assert_eq!(values.len(), 3);
    }
}
