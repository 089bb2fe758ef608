//! Semantic checks applied after deserialisation

use crate::error::{ConfigError, Result};
use crate::settings::{RealtimeConfig, TransportKind};

impl RealtimeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.session.channel_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "session.channel_buffer must be greater than zero".to_string(),
            ));
        }

        if self.session.tenant_field.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.tenant_field cannot be empty".to_string(),
            ));
        }

        if self.session.drain_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "session.drain_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.notifications.dedupe_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "notifications.dedupe_capacity must be greater than zero".to_string(),
            ));
        }

        if self.transport.kind == TransportKind::Nats
            && self.transport.nats_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "transport.nats_url is required when transport.kind is nats".to_string(),
            ));
        }

        let prefix = &self.transport.subject_prefix;
        if prefix.trim().is_empty()
            || prefix.contains(&['.', '*', '>'][..])
            || prefix.contains(char::is_whitespace)
        {
            return Err(ConfigError::ValidationError(format!(
                "transport.subject_prefix '{}' must be a single subject token",
                self.transport.subject_prefix
            )));
        }

        Ok(())
    }
}
