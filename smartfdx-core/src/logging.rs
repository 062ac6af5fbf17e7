//! Unified logging system
//!
//! Provides structured logging with configurable format and output

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to log to file
    pub log_to_file: bool,
    /// Log file path (if log_to_file is true)
    pub log_file_path: Option<String>,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            log_to_file: false,
            log_file_path: None,
            filter_directives: vec![
                "smartfdx_core=debug".to_string(),
                "smartfdx_web=debug".to_string(),
            ],
        }
    }
}

/// Initialize the logging system
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Add custom filter directives
    for directive in &config.filter_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            if config.log_to_file {
                if let Some(log_path) = &config.log_file_path {
                    let file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)?;

                    registry.with(fmt_layer.with_writer(file)).init();
                } else {
                    return Err("log_file_path must be specified when log_to_file is true".into());
                }
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            if config.log_to_file {
                if let Some(log_path) = &config.log_file_path {
                    let file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)?;

                    registry.with(fmt_layer.with_writer(file)).init();
                } else {
                    return Err("log_file_path must be specified when log_to_file is true".into());
                }
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            if config.log_to_file {
                if let Some(log_path) = &config.log_file_path {
                    let file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_path)?;

                    registry.with(fmt_layer.with_writer(file)).init();
                } else {
                    return Err("log_file_path must be specified when log_to_file is true".into());
                }
            } else {
                registry.with(fmt_layer.with_writer(io::stdout)).init();
            }
        }
    }

    Ok(())
}
