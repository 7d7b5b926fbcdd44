//! Structured logging infrastructure for covid-figs
//!
//! The subscriber is returned as a [`Dispatch`] instead of being installed
//! process-wide. The job runs inside that dispatch with
//! [`tracing::instrument::WithSubscriber`], so every component logs to the
//! sink handed to it by the entry point.

use serde::{Deserialize, Serialize};
use std::io;
use tracing::Dispatch;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    EnvFilter,
};

use crate::error::{FigsError, Result};

/// Output format of the log sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "covid_figs_graphs=trace")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Whether to include span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_spans: false,
            include_targets: true,
        }
    }
}

/// Build a log sink writing to stderr.
///
/// Stdout is reserved for the run report.
pub fn build_dispatch(config: &LoggingConfig) -> Result<Dispatch> {
    let env_filter = EnvFilter::try_new(&config.level).map_err(|e| {
        FigsError::config_with_source(format!("Invalid log filter '{}'", config.level), e)
    })?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let dispatch = match config.format {
        LogFormat::Json => Dispatch::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(io::stderr),
            ),
        ),
        LogFormat::Pretty => Dispatch::new(
            registry.with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(io::stderr),
            ),
        ),
        LogFormat::Compact => Dispatch::new(
            registry.with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_ansi(false)
                    .with_writer(io::stderr),
            ),
        ),
    };

    Ok(dispatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.include_spans);
        assert!(config.include_targets);
    }

    #[test]
    fn test_build_dispatch_for_every_format() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            let config = LoggingConfig {
                format,
                ..LoggingConfig::default()
            };
            let dispatch = build_dispatch(&config).expect("dispatch should build");
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::info!(?format, "log sink ready");
            });
        }
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig {
            level: "covid_figs=[".to_string(),
            ..LoggingConfig::default()
        };
        let err = build_dispatch(&config).unwrap_err();
        assert!(matches!(err, FigsError::Config { .. }));
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let format: LogFormat = serde_yaml::from_str("json").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
