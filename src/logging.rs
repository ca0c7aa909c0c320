//! Log setup.
//!
//! Headless runs write to stderr. The TUI owns the terminal, so it logs to a
//! file instead.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init(target: LogTarget<'_>) -> Result<()> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init()
                .context("install log subscriber")?;
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .context("install log subscriber")?;
        }
    }
    Ok(())
}

/// `<cache dir>/backtest-console/backtest-console.log`, or the working
/// directory when the platform has no cache dir.
pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("backtest-console"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("backtest-console.log")
}
