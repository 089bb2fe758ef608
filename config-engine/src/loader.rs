//! Layered loading through the `config` crate

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::settings::RealtimeConfig;

pub const ENV_PREFIX: &str = "HIMS_LIVE";

impl RealtimeConfig {
    /// Load defaults, then `path` (if any), then `HIMS_LIVE_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading realtime configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: RealtimeConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse a YAML document without consulting the environment
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let parsed: RealtimeConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Effective configuration rendered as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TransportKind;
    use logger_redacted::LogFormat;
    use std::io::Write;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = RealtimeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.transport.kind, TransportKind::Memory);
        assert_eq!(config.session.channel_buffer, 256);
        assert_eq!(config.notifications.dedupe_ttl_seconds, 600);
        assert!(config.logging.redaction_enabled);
    }

    #[test]
    fn test_nested_overrides() {
        let config = RealtimeConfig::from_yaml_str(
            r"
notifications:
  dedupe_ttl_seconds: 30
logging:
  format: json
  log_level: debug
",
        )
        .unwrap();
        assert_eq!(config.notifications.dedupe_ttl_seconds, 30);
        assert_eq!(config.notifications.dedupe_capacity, 10_000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.log_level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "session:\n  tenant_field: org_id").unwrap();

        let config = RealtimeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.session.tenant_field, "org_id");
    }

    #[test]
    fn test_missing_file_is_a_source_error() {
        let result = RealtimeConfig::load(Some(Path::new("/nonexistent/hims-live.yaml")));
        assert!(matches!(result, Err(ConfigError::SourceError(_))));
    }

    #[test]
    fn test_yaml_round_trip_keeps_transport() {
        let config = RealtimeConfig::from_yaml_str(
            "transport:\n  kind: nats\n  nats_url: nats://localhost:4222\n",
        )
        .unwrap();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("kind: nats"));
        assert!(yaml.contains("nats://localhost:4222"));
    }
}
