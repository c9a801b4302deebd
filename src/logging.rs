//! Structured logging setup.
//!
//! JSON output for production runs, pretty output while developing, written
//! through a non-blocking appender to stderr, stdout or a daily-rotated file.
//! Stdout is left to the plan itself unless `LOG_OUTPUT=stdout` is asked for.

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

/// Configuration for logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log format: "json" or "pretty"
    pub format: LogFormat,
    /// Log output: "stdout", "stderr", or "file"
    pub output: LogOutput,
    /// Directory for log files (when output is "file")
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    pub service_name: String,
    pub service_version: String,
    /// Environment (e.g., "dev", "staging", "production")
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
    /// File with daily rotation
    File,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let is_production = environment == "production" || environment == "prod";

        Self {
            format: if is_production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: "stock-planner".to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            enable_rotation: true,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Ok(output) = env::var("LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                "file" => LogOutput::File,
                _ => config.output,
            };
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        config
    }

    fn is_production(&self) -> bool {
        self.environment == "production" || self.environment == "prod"
    }
}

/// Initialize structured logging with the given configuration.
///
/// Returns a WorkerGuard that must be held for the lifetime of the application
/// to ensure all logs are flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if config.is_production() {
            "warn"
        } else {
            "info"
        };
        EnvFilter::new(format!("{default_level},umya_spreadsheet=warn"))
    });

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

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
                .with_line_number(true)
                .with_file(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_filter(env_filter);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(false)
                .with_file(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(config.output != LogOutput::File)
                .with_filter(env_filter);
            registry.with(fmt_layer).init();
        }
    }

    tracing::debug!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        "logging initialized"
    );

    Ok(Some(guard))
}

/// Span wrapping one pipeline stage.
pub fn operation_span(name: &'static str) -> tracing::Span {
    tracing::info_span!(
        "operation",
        operation.name = name,
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Span wrapping the ingestion of one workbook.
pub fn workbook_span(workbook_id: &str) -> tracing::Span {
    tracing::info_span!("workbook", workbook_id = workbook_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_writes_to_stderr() {
        let config = LoggingConfig::default();
        assert_eq!(config.service_name, "stock-planner");
        assert_eq!(config.output, LogOutput::Stderr);
    }

    #[test]
    fn from_env_overrides() {
        unsafe {
            env::set_var("LOG_FORMAT", "json");
            env::set_var("LOG_OUTPUT", "file");
            env::set_var("LOG_DIR", "/tmp/stock-planner-logs");
        }

        let config = LoggingConfig::from_env();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::File);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/stock-planner-logs"));

        unsafe {
            env::remove_var("LOG_FORMAT");
            env::remove_var("LOG_OUTPUT");
            env::remove_var("LOG_DIR");
        }
    }
}
