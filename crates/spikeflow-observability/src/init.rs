// Copyright 2025 Spikeflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always on; a file layer is added when a log path is
//! given. File writes go through a non-blocking worker so logging never
//! stalls the stepping loop.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable holding a full filter expression, e.g.
/// `spikeflow_engine=trace,info`
pub const FILTER_ENV: &str = "SPIKEFLOW_LOG";

/// Keeps the non-blocking file worker alive; logs flush when this drops.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of the log file, if file logging is active.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Initialize the global subscriber.
///
/// # Arguments
/// * `default_level` - Filter used when `SPIKEFLOW_LOG` is unset
///   (`error`/`warn`/`info`/`debug`/`trace`)
/// * `log_file` - Optional file that receives a copy of all output
///
/// # Errors
///
/// Fails if the log file cannot be created or a subscriber is already
/// installed.
pub fn init_logging(default_level: &str, log_file: Option<&Path>) -> Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log filter '{default_level}'"))?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(env_filter);

    let mut file_guard = None;
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory: {}", parent.display())
                })?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            file_guard = Some(guard);

            // The file layer gets its own filter instance at the same level.
            let filter = EnvFilter::try_from_env(FILTER_ENV)
                .or_else(|_| EnvFilter::try_new(default_level))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file: log_file.map(Path::to_path_buf),
    })
}

/// Console-only logging at `info`.
pub fn init_logging_default() -> Result<LoggingGuard> {
    init_logging("info", None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracing::info;

    // The global subscriber can only be installed once per process, so the
    // whole flow lives in one test.
    #[test]
    fn test_file_logging_writes_and_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("run.log");

        let guard = init_logging("info", Some(&path)).unwrap();
        assert_eq!(guard.log_file(), Some(path.as_path()));
        info!(marker = "flush-check", "file logging test line");
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("file logging test line"));

        // Second install attempt must fail, not panic.
        assert!(init_logging("info", None).is_err());
    }

    #[test]
    fn test_invalid_default_level_is_rejected() {
        assert!(EnvFilter::try_new("not a filter ===").is_err());
    }
}
