//! Configuration management for the HIMS Live realtime layer
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables prefixed with `HIMS_LIVE_` (nested keys separated by
//! `__`, e.g. `HIMS_LIVE_TRANSPORT__NATS_URL`).
//!
//! # Example
//!
//! ```rust
//! use config_engine::{RealtimeConfig, TransportKind};
//!
//! let config = RealtimeConfig::from_yaml_str(
//!     r#"
//! transport:
//!   kind: nats
//!   nats_url: nats://realtime.internal:4222
//! session:
//!   channel_buffer: 128
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.transport.kind, TransportKind::Nats);
//! assert_eq!(config.session.channel_buffer, 128);
//! assert_eq!(config.session.tenant_field, "hospital_id");
//! ```

pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use error::*;
pub use settings::*;
