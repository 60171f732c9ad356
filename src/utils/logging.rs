//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber built from [`LoggingConfig`]: a console
//! layer, a file layer, or both, each plain or JSON. `RUST_LOG` overrides the
//! configured level when set.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{AgioError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
///
/// Returns `Ok(true)` when this call installed it and `Ok(false)` when a global
/// subscriber was already in place.
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.log_to_console {
        let layer = if config.json_format {
            fmt::layer()
                .json()
                .with_filter(level_filter(config.log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_filter(level_filter(config.log_level))
                .boxed()
        };
        layers.push(layer);
    }

    if config.log_to_file {
        let path = config.log_file_path.as_deref().ok_or_else(|| {
            AgioError::ConfigError(
                "log_file_path must be specified when log_to_file is true".to_string(),
            )
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AgioError::ConfigError(format!("Failed to open log file: {e}")))?;
        let writer = Mutex::new(file);

        let layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(level_filter(config.log_level))
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(level_filter(config.log_level))
                .boxed()
        };
        layers.push(layer);
    }

    let installed = tracing_subscriber::registry().with(layers).try_init().is_ok();
    if installed {
        tracing::info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    }
    Ok(installed)
}
