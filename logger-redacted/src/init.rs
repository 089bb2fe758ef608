//! Global subscriber installation

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggerConfig};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter directive: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

impl From<LoggerError> for error_common::HimsError {
    fn from(err: LoggerError) -> Self {
        error_common::HimsError::ConfigError(err.to_string())
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
pub fn build_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!(
            "{level},async_nats=warn",
            level = config.log_level
        ))
        .map_err(|e| LoggerError::InvalidFilter(e.to_string())),
    }
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).json())
            .try_init(),
    };

    result.map_err(|e| LoggerError::AlreadyInstalled(e.to_string()))
}
