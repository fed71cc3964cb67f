// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Spikeflow Observability
//!
//! Tracing setup shared by the scenario runner and anything else that embeds
//! the engine. One call wires a console layer (human-readable) and an
//! optional file layer (one plain-text log per run) behind a single
//! `EnvFilter`.
//!
//! The filter comes from `SPIKEFLOW_LOG` when set, otherwise from the
//! configured default level, so a scenario's `[logging]` section can be
//! overridden without editing the file.

pub mod init;

pub use init::{init_logging, init_logging_default, LoggingGuard};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
