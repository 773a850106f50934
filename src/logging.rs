//! Logger capability and the tracing setup behind it.
//!
//! The store only sees [`Logger`]; the binary wires it to `tracing` and sends
//! the output to a file, since the terminal is owned by the TUI.

use std::fs::{self, OpenOptions};
use std::rc::Rc;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Fire-and-forget diagnostic sink.
pub trait Logger {
    fn log(&self, message: &str);

    fn warn(&self, message: &str) {
        self.log(message);
    }
}

impl<L: Logger + ?Sized> Logger for Rc<L> {
    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn log(&self, message: &str) {
        (**self).log(message)
    }

    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
}

/// Forwards store messages to `tracing` under the `rsvp` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "rsvp", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "rsvp", "{message}");
    }
}

/// Install the global subscriber, appending plain-text lines to
/// `config.log_path`.
pub fn init_tracing(config: &AppConfig) -> Result<()> {
    if let Some(parent) = config.log_path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
