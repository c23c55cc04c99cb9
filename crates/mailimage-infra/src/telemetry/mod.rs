//! Tracing initialisation
//!
//! Logs go to stderr, or to an append-mode log file when one is configured and the
//! process is not in debug mode. Production environments log JSON lines.

use mailimage_core::Config;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "mailimage=info,tower_http=info";

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub debug: bool,
    pub log_path: Option<PathBuf>,
    pub json: bool,
}

impl TelemetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debug: config.debug,
            log_path: config.log_path.clone(),
            json: config.is_production(),
        }
    }

    /// Log file to write to, if any. Debug mode always logs to stderr.
    pub fn log_file(&self) -> Option<&Path> {
        if self.debug {
            None
        } else {
            self.log_path.as_deref()
        }
    }
}

pub(crate) fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let fmt_layer = match config.log_file() {
        Some(path) => {
            let file = open_log_file(path).map_err(|e| {
                anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e)
            })?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if config.json {
                layer.json().boxed()
            } else {
                layer.boxed()
            }
        }
        None => {
            let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if config.json {
                layer.json().boxed()
            } else {
                layer.boxed()
            }
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!(
        log_file = ?config.log_file(),
        json = config.json,
        "Telemetry initialised"
    );
    Ok(())
}
