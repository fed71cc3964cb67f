// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Scenario Runner

Loads a TOML scenario, builds the network, runs it to completion, and prints
per-population firing statistics. With an output path, the full observation
record (spikes, snapshots, rate bins) is exported as JSON.

Usage:
  cargo run --bin run_scenario -- [scenario.toml] [--output results.json]

With no scenario argument the file is discovered like any other embedding:
`SPIKEFLOW_SCENARIO_PATH`, then `./spikeflow.toml` and its ancestors.
*/

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use spikeflow::engine::SnapshotKey;
use spikeflow::parking_lot::Mutex;
use spikeflow::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" | "-o" => {
                let Some(path) = args.next() else {
                    eprintln!("--output requires a path");
                    std::process::exit(1);
                };
                output_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                eprintln!("Usage: run_scenario [scenario.toml] [--output results.json]");
                return Ok(());
            }
            _ => scenario_path = Some(PathBuf::from(arg)),
        }
    }

    let scenario = load_scenario(scenario_path.as_deref())?;
    let _logging = spikeflow::observability::init_logging(
        &scenario.logging.level,
        scenario.logging.file.as_deref(),
    )?;

    let recorder = Arc::new(Mutex::new(MemoryRecorder::new()));
    let mut sim = build_simulation(&scenario, Box::new(recorder.clone()))?;

    println!("Spikeflow Scenario Runner");
    println!(
        "  dt = {} ms, duration = {} ms, seed = {}",
        scenario.simulation.dt, scenario.simulation.duration_ms, scenario.simulation.seed
    );
    for summary in sim.connectivity_summaries() {
        println!(
            "  projection '{}': {} edges ({} silent sources, {} silent targets)",
            summary.projection, summary.edges, summary.silent_sources, summary.silent_targets
        );
    }

    let report = sim.run()?;

    println!(
        "Run complete: {} steps, {} spikes",
        report.steps, report.total_spikes
    );
    let seconds = report.duration_ms * 1e-3;
    let rec = recorder.lock();
    for pop in sim.populations() {
        let spikes: usize = rec
            .spikes
            .iter()
            .filter(|(id, _, _)| *id == pop.id)
            .map(|(_, _, neurons)| neurons.len())
            .sum();
        let rate = if seconds > 0.0 && pop.len() > 0 {
            spikes as f64 / (seconds * pop.len() as f64)
        } else {
            0.0
        };
        println!(
            "  population '{}': {} neurons, {} spikes, {:.2} Hz mean rate",
            pop.name,
            pop.len(),
            spikes,
            rate
        );
    }

    if let Some(path) = output_path {
        let export = export_json(&rec, &report);
        fs::write(&path, serde_json::to_string_pretty(&export)?)?;
        println!("Observations written to {}", path.display());
    }

    Ok(())
}

fn export_json(rec: &MemoryRecorder, report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "report": {
            "steps": report.steps,
            "duration_ms": report.duration_ms,
            "total_spikes": report.total_spikes,
        },
        "spikes": rec
            .spikes
            .iter()
            .map(|(population, time, neurons)| {
                serde_json::json!({
                    "population": population.0,
                    "time_ms": time,
                    "neurons": neurons,
                })
            })
            .collect::<Vec<_>>(),
        "snapshots": rec
            .snapshots
            .iter()
            .map(|(time, variable, key, values)| {
                let key = match key {
                    SnapshotKey::Population(id) => serde_json::json!({ "population": id.0 }),
                    SnapshotKey::Projection(name) => serde_json::json!({ "projection": name }),
                };
                serde_json::json!({
                    "time_ms": time,
                    "variable": variable,
                    "key": key,
                    "values": values,
                })
            })
            .collect::<Vec<_>>(),
        "rate_bins": rec
            .rate_bins
            .iter()
            .map(|(population, t_start, t_end, count)| {
                serde_json::json!({
                    "population": population.0,
                    "t_start_ms": t_start,
                    "t_end_ms": t_end,
                    "count": count,
                })
            })
            .collect::<Vec<_>>(),
    })
}
