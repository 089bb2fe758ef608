//! Tenant-scoped realtime subscriptions for HIMS Live
//!
//! Dashboards in a hospital deployment watch four tables for live changes:
//! the patient queue, lab orders, prescriptions and critical alerts. This
//! crate owns that fan-out:
//!
//! - **Subscription manager**: opens one channel per watched entity, always
//!   filtered to the current hospital (`hospital_id=eq.<tenant>`)
//! - **Change router**: turns each change event into cache invalidations
//! - **Notification presenter**: raises toasts for selected events, deduplicated
//!   by key so a redelivered critical alert does not stack
//! - **Session / lifecycle controller**: pairs every open with a close and
//!   re-subscribes when the tenant changes, closing the old channels first
//!
//! Every session runs a single consumer task that merges all channel streams,
//! so no two events are ever processed concurrently.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use config_engine::RealtimeConfig;
//! use events_bus::{
//!     InMemoryTransport, LifecycleController, RecordingCache, RecordingSink,
//!     SubscriptionSession, TenantContext, TenantId,
//! };
//!
//! # async fn demo() {
//! let config = RealtimeConfig::default();
//! let transport = Arc::new(InMemoryTransport::new(config.session.channel_buffer));
//! let session = SubscriptionSession::new(
//!     transport,
//!     Arc::new(RecordingCache::default()),
//!     Arc::new(RecordingSink::default()),
//!     &config,
//! );
//!
//! let tenants = TenantContext::new();
//! let controller = LifecycleController::new(session, &tenants);
//! let (unmount_tx, unmount_rx) = tokio::sync::oneshot::channel::<()>();
//! let view = tokio::spawn(controller.run(async move {
//!     let _ = unmount_rx.await;
//! }));
//!
//! tenants.login(TenantId::new("hosp-123").unwrap());
//! // ... the view is live ...
//! let _ = unmount_tx.send(());
//! let summaries = view.await.unwrap();
//! assert_eq!(summaries.len(), 1);
//! # }
//! ```

pub mod cache;
pub mod entity;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod memory;
pub mod nats;
pub mod notifier;
pub mod router;
pub mod session;
pub mod stats;
pub mod subscription;
pub mod tenant;
pub mod transport;

pub use cache::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use lifecycle::*;
pub use memory::*;
pub use nats::*;
pub use notifier::*;
pub use router::*;
pub use session::*;
pub use stats::*;
pub use subscription::*;
pub use tenant::*;
pub use transport::*;
