use error_common::codes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source could not be read: {0}")]
    SourceError(String),

    #[error("Configuration parsing failed: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::SourceError(_) => codes::config::SOURCE_UNREADABLE,
            ConfigError::ParseError(_) => codes::config::PARSE_FAILED,
            ConfigError::ValidationError(_) => codes::config::VALIDATION_FAILED,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(_) | config::ConfigError::Foreign(_) => {
                ConfigError::SourceError(err.to_string())
            }
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for error_common::HimsError {
    fn from(err: ConfigError) -> Self {
        error_common::HimsError::ConfigError(format!("{} {}", err.code(), err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
