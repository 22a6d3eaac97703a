//! Logging initialization.
//!
//! Installs a registry with an env filter, a stderr layer, an optional
//! daily-rolling file layer and any extra layers the caller brings (for
//! example the UI event layer).

use shellmate_core::config::LoggingConfig;
use shellmate_core::error::{Result, ShellmateError};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable overriding the configured filter.
pub const LOG_ENV_VAR: &str = "SHELLMATE_LOG";

/// File name prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "shellmate.log";

const FALLBACK_DIRECTIVE: &str = "info";

/// Subscriber the extra layers are stacked on.
pub type LogSubscriber = Layered<EnvFilter, Registry>;

/// Type-erased layer accepted by [`init_logging`].
pub type BoxedLayer = Box<dyn Layer<LogSubscriber> + Send + Sync + 'static>;

/// Picks the filter directive: the environment wins over the config.
fn filter_directive(config: &LoggingConfig, env_value: Option<String>) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let directive = filter_directive(config, std::env::var(LOG_ENV_VAR).ok());
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!(
            "Invalid log filter '{}': {}. Falling back to '{}'.",
            directive, e, FALLBACK_DIRECTIVE
        );
        EnvFilter::new(FALLBACK_DIRECTIVE)
    })
}

/// Installs the global subscriber.
///
/// Returns the file writer guard when file logging is on; keep it alive for
/// the lifetime of the process or buffered lines are lost.
pub fn init_logging(
    config: &LoggingConfig,
    log_dir: &Path,
    extra_layers: Vec<BoxedLayer>,
) -> Result<Option<WorkerGuard>> {
    let mut layers = extra_layers;

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    layers.push(if config.json {
        stderr_layer.json().boxed()
    } else {
        stderr_layer.boxed()
    });

    let guard = if config.file {
        std::fs::create_dir_all(log_dir)?;
        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false);
        layers.push(if config.json {
            file_layer.json().boxed()
        } else {
            file_layer.boxed()
        });
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layers)
        .try_init()
        .map_err(|e| ShellmateError::internal(format!("Logging already initialized: {}", e)))?;

    tracing::info!(
        "[Logging] Initialized (level: {}, json: {}, file: {})",
        config.level,
        config.json,
        config.file
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_env_overrides_configured_level() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };

        assert_eq!(filter_directive(&config, None), "warn");
        assert_eq!(
            filter_directive(&config, Some("shellmate_application=debug".to_string())),
            "shellmate_application=debug"
        );
        assert_eq!(filter_directive(&config, Some("  ".to_string())), "warn");
    }

    #[test]
    fn test_init_with_file_only_once() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            level: "debug".to_string(),
            json: false,
            file: true,
        };

        let guard = init_logging(&config, &log_dir, Vec::new()).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());

        let second = init_logging(&LoggingConfig::default(), &log_dir, Vec::new());
        assert!(second.is_err());
    }
}
