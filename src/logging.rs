//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file. Command
//! runs (uploads, export) log to stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    /// Append to a file, without ANSI colors.
    File(PathBuf),
    Stderr,
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init(target: LogTarget, default_filter: &str) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), default_filter);

    let result = match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

/// Filter from `env` when it parses, else `fallback`, else `info`.
fn build_filter(env: Option<&str>, fallback: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
