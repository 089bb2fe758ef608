// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the `fmt` layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub redaction_enabled: bool,
    pub log_level: String,
    pub format: LogFormat,
    /// Record fields whose values are always masked when a payload is logged
    pub sensitive_fields: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            sensitive_fields: vec![
                "patient_name".to_string(),
                "full_name".to_string(),
                "email".to_string(),
                "phone".to_string(),
                "date_of_birth".to_string(),
                "address".to_string(),
            ],
        }
    }
}
