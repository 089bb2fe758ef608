//! Settings model for the realtime layer

use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};

/// Which realtime backend the session talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process backend, used for local runs and replays
    #[default]
    Memory,
    /// NATS subjects carrying database change events
    Nats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub kind: TransportKind,
    pub nats_url: Option<String>,
    /// Leading subject token, channels subscribe to `<prefix>.<table>.<field>.<tenant>`
    pub subject_prefix: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: TransportKind::Memory,
            nats_url: None,
            subject_prefix: "realtime".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Capacity of each per-channel event queue
    pub channel_buffer: usize,
    /// Record column that scopes rows to a hospital
    pub tenant_field: String,
    /// Upper bound on waiting for the consumer to drain after channels close
    pub drain_timeout_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            channel_buffer: 256,
            tenant_field: "hospital_id".to_string(),
            drain_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// How long a dedupe key suppresses repeated toasts
    pub dedupe_ttl_seconds: u64,
    pub dedupe_capacity: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            dedupe_ttl_seconds: 600,
            dedupe_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub transport: TransportSettings,
    pub session: SessionSettings,
    pub notifications: NotificationSettings,
    pub logging: LoggerConfig,
}
