//! Structured logging setup.
//!
//! - JSON formatting for production
//! - Pretty formatting for development
//! - Optional file output with daily rotation
//! - Contextual fields (service, version, environment)

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Directory for log files (when output is "file")
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_name: String,
    pub service_version: String,
    /// e.g. "development", "staging", "production"
    pub environment: String,
    pub enable_rotation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl LoggingConfig {
    fn for_environment(environment: String) -> Self {
        let format = if is_production(&environment) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        Self {
            format,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: "gauge-site".to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            enable_rotation: true,
        }
    }

    /// Reads `ENVIRONMENT`, `LOG_FORMAT`, `LOG_OUTPUT` and `LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("ENV"))
            .unwrap_or_else(|| "development".to_string());
        let mut config = Self::for_environment(environment);

        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Some(output) = lookup("LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                "file" => LogOutput::File,
                _ => config.output,
            };
        }

        if let Some(log_dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        config
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment("development".to_string())
    }
}

fn is_production(environment: &str) -> bool {
    environment == "production" || environment == "prod"
}

/// Installs the global subscriber.
///
/// The returned guard must be held for the lifetime of the process so that
/// buffered log lines are flushed on exit.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if config.is_production() { "info" } else { "debug" };
        EnvFilter::new(format!("{default_level},hyper=info,tower=info,reqwest=info"))
    });

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("failed to create log directory")?;
            let file_appender = if config.enable_rotation {
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix)
            } else {
                tracing_appender::rolling::never(&config.log_dir, &config.log_file_prefix)
            };
            tracing_appender::non_blocking(file_appender)
        }
    };

    let registry = tracing_subscriber::registry();
    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_current_span(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter);
            registry
                .with(fmt_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(config.output != LogOutput::File)
                .with_filter(env_filter);
            registry
                .with(fmt_layer)
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        "logging initialized"
    );

    Ok(Some(guard))
}

/// Logs at warn when `$duration` exceeds `$threshold_ms`, debug otherwise.
#[macro_export]
macro_rules! log_slow_operation {
    ($duration:expr, $threshold_ms:expr, $($arg:tt)*) => {
        {
            let duration_ms = $duration.as_millis() as u64;
            if duration_ms > $threshold_ms {
                tracing::warn!(
                    duration_ms = duration_ms,
                    threshold_ms = $threshold_ms,
                    $($arg)*
                );
            } else {
                tracing::debug!(
                    duration_ms = duration_ms,
                    $($arg)*
                );
            }
        }
    };
}

/// Log a security event such as a rejected admin token.
#[macro_export]
macro_rules! log_security_event {
    ($event_type:expr, $($arg:tt)*) => {
        tracing::warn!(
            security.event_type = %$event_type,
            $($arg)*
        );
    };
}

/// Span wrapping one HTTP request.
pub fn request_span(method: &str, route: &str) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        http.method = method,
        http.route = route,
        http.status = tracing::field::Empty,
        service = env!("CARGO_PKG_NAME"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults_to_pretty() {
        let config = LoggingConfig::from_lookup(lookup(&[]));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.output, LogOutput::Stderr);
        assert_eq!(config.service_name, "gauge-site");
    }

    #[test]
    fn test_production_defaults_to_json() {
        let config = LoggingConfig::from_lookup(lookup(&[("ENVIRONMENT", "production")]));
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = LoggingConfig::from_lookup(lookup(&[
            ("LOG_FORMAT", "json"),
            ("LOG_OUTPUT", "file"),
            ("LOG_DIR", "/var/log/gauge-site"),
        ]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/gauge-site"));

        let ignored = LoggingConfig::from_lookup(lookup(&[("LOG_FORMAT", "xml")]));
        assert_eq!(ignored.format, LogFormat::Pretty);
    }
}
