//! Explicit open/close pairing of one tenant's channels
//!
//! [`SubscriptionSession::open`] opens every watched channel and spawns a
//! single consumer task that merges their streams. Because there is exactly one
//! consumer, routing and presentation never run concurrently for two events.
//! [`SubscriptionSession::close`] closes the transport channels first, which
//! ends their streams, then waits for the consumer to drain and exit.

use std::sync::Arc;
use std::time::Duration;

use config_engine::RealtimeConfig;
use logger_redacted::{PiiRedactor, RedactionConfig};
use tokio::task::JoinHandle;
use tokio_stream::{StreamExt, StreamMap};
use tracing::{debug, info, warn};

use crate::entity::WatchedEntity;
use crate::notifier::{NotificationPresenter, NotificationSink, Presentation};
use crate::router::{ChangeRouter, DataCache};
use crate::stats::{SessionStats, StatsSnapshot};
use crate::subscription::{DegradedChannel, SubscriptionManager};
use crate::tenant::TenantId;
use crate::transport::{ChangeStream, ChannelHandle, ChannelSpec, RealtimeTransport};

/// Live channels of one tenant; must be handed back to [`SubscriptionSession::close`]
///
/// Dropping a handle without closing it aborts the consumer task, but the
/// transport channels stay open; a warning names how many leaked.
#[must_use = "an open session leaks its channels unless it is closed"]
pub struct SessionHandle {
    tenant: TenantId,
    channels: Vec<ChannelHandle>,
    degraded: Vec<DegradedChannel>,
    consumer: Option<JoinHandle<()>>,
    stats: Arc<SessionStats>,
}

impl SessionHandle {
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn degraded(&self) -> &[DegradedChannel] {
        &self.degraded
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.abort();
        }
        if !self.channels.is_empty() {
            warn!(
                tenant_id = %self.tenant,
                channels = self.channels.len(),
                "Session handle dropped without close, realtime channels leaked"
            );
        }
    }
}

/// What a closed session did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub tenant: TenantId,
    pub opened: usize,
    pub closed: usize,
    pub degraded: Vec<DegradedChannel>,
    pub stats: StatsSnapshot,
}

pub struct SubscriptionSession {
    manager: SubscriptionManager,
    router: Arc<ChangeRouter>,
    presenter: Arc<NotificationPresenter>,
    redactor: Arc<PiiRedactor>,
    entities: Vec<WatchedEntity>,
    drain_timeout: Duration,
}

impl SubscriptionSession {
    pub fn new(
        transport: Arc<dyn RealtimeTransport>,
        cache: Arc<dyn DataCache>,
        sink: Arc<dyn NotificationSink>,
        config: &RealtimeConfig,
    ) -> Self {
        Self {
            manager: SubscriptionManager::new(transport, config.session.tenant_field.clone()),
            router: Arc::new(ChangeRouter::new(cache)),
            presenter: Arc::new(NotificationPresenter::new(sink, &config.notifications)),
            redactor: Arc::new(PiiRedactor::new(RedactionConfig::from(&config.logging))),
            entities: WatchedEntity::ALL.to_vec(),
            drain_timeout: Duration::from_millis(config.session.drain_timeout_ms),
        }
    }

    /// Restrict the session to a subset of entity types
    pub fn with_entities(mut self, entities: &[WatchedEntity]) -> Self {
        self.entities = entities.to_vec();
        self
    }

    /// Channel specs an `open` for `tenant` would request
    pub fn plan(&self, tenant: &TenantId) -> Vec<ChannelSpec> {
        self.manager.plan(tenant, &self.entities)
    }

    pub async fn open(&self, tenant: &TenantId) -> SessionHandle {
        let opened = self.manager.open_all(Some(tenant), &self.entities).await;

        let mut streams: StreamMap<WatchedEntity, ChangeStream> = StreamMap::new();
        for (entity, stream) in opened.streams {
            streams.insert(entity, stream);
        }

        let stats = Arc::new(SessionStats::default());
        let consumer = tokio::spawn(consume(
            tenant.clone(),
            streams,
            self.router.clone(),
            self.presenter.clone(),
            self.redactor.clone(),
            stats.clone(),
        ));

        SessionHandle {
            tenant: tenant.clone(),
            channels: opened.handles,
            degraded: opened.degraded,
            consumer: Some(consumer),
            stats,
        }
    }

    pub async fn close(&self, mut handle: SessionHandle) -> SessionSummary {
        let tenant = handle.tenant.clone();
        let channels = std::mem::take(&mut handle.channels);
        let degraded = std::mem::take(&mut handle.degraded);
        let consumer = handle.consumer.take();
        let stats = handle.stats.clone();
        drop(handle);

        let opened = channels.len();
        let closed = self.manager.close_all(&tenant, channels).await;

        if let Some(mut consumer) = consumer {
            match tokio::time::timeout(self.drain_timeout, &mut consumer).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(tenant_id = %tenant, error = %e, "Realtime consumer task failed"),
                Err(_) => {
                    warn!(tenant_id = %tenant, "Realtime consumer did not drain in time, aborting");
                    consumer.abort();
                }
            }
        }

        let summary = SessionSummary {
            tenant,
            opened,
            closed,
            degraded,
            stats: stats.snapshot(),
        };
        info!(
            tenant_id = %summary.tenant,
            opened = summary.opened,
            closed = summary.closed,
            events = summary.stats.events_received,
            "Realtime session closed"
        );
        summary
    }
}

async fn consume(
    tenant: TenantId,
    mut streams: StreamMap<WatchedEntity, ChangeStream>,
    router: Arc<ChangeRouter>,
    presenter: Arc<NotificationPresenter>,
    redactor: Arc<PiiRedactor>,
    stats: Arc<SessionStats>,
) {
    while let Some((channel_entity, event)) = streams.next().await {
        if let Some(record) = event.primary_record() {
            logger_redacted::redacted_debug!(
                redactor,
                record,
                tenant_id = %tenant,
                entity = %channel_entity,
                kind = ?event.kind,
                "Change event received"
            );
        }

        let invalidated = router.route(&event);
        stats.record_event(invalidated);

        match presenter.notify(&event) {
            Presentation::Shown(_) => stats.record_shown(),
            Presentation::Suppressed(_) => stats.record_suppressed(),
            Presentation::Skipped => {}
        }
    }
    debug!(tenant_id = %tenant, "All realtime channels ended, consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecordingCache;
    use crate::entity::CacheKey;
    use crate::event::ChangeEvent;
    use crate::memory::InMemoryTransport;
    use crate::notifier::RecordingSink;
    use serde_json::json;

    struct Fixture {
        transport: Arc<InMemoryTransport>,
        cache: Arc<RecordingCache>,
        sink: Arc<RecordingSink>,
        session: SubscriptionSession,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(InMemoryTransport::new(16));
        let cache = Arc::new(RecordingCache::default());
        let sink = Arc::new(RecordingSink::default());
        let session = SubscriptionSession::new(
            transport.clone(),
            cache.clone(),
            sink.clone(),
            &RealtimeConfig::default(),
        );
        Fixture {
            transport,
            cache,
            sink,
            session,
        }
    }

    fn event(entity: WatchedEntity, value: serde_json::Value) -> ChangeEvent {
        ChangeEvent::insert(entity, value.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_events_are_drained_before_close_returns() {
        let fx = fixture();
        let tenant = TenantId::new("hosp-1").unwrap();
        let handle = fx.session.open(&tenant).await;
        assert_eq!(handle.channel_count(), 4);

        for i in 0..5 {
            fx.transport
                .publish(event(
                    WatchedEntity::QueueEntry,
                    json!({"id": format!("q-{i}"), "hospital_id": "hosp-1"}),
                ))
                .await;
        }

        let summary = fx.session.close(handle).await;
        assert_eq!(summary.opened, 4);
        assert_eq!(summary.closed, 4);
        assert_eq!(summary.stats.events_received, 5);
        assert_eq!(summary.stats.invalidations, 10);
        assert_eq!(fx.sink.presented().len(), 5);
        assert_eq!(
            fx.cache.invalidations().iter().filter(|k| **k == CacheKey::QUEUE).count(),
            5
        );
    }

    #[tokio::test]
    async fn test_other_tenant_rows_never_arrive() {
        let fx = fixture();
        let handle = fx.session.open(&TenantId::new("hosp-1").unwrap()).await;

        let delivered = fx
            .transport
            .publish(event(
                WatchedEntity::CriticalAlert,
                json!({"id": "a-1", "hospital_id": "hosp-2", "message": "x"}),
            ))
            .await;
        assert_eq!(delivered, 0);

        let summary = fx.session.close(handle).await;
        assert_eq!(summary.stats.events_received, 0);
        assert!(fx.sink.presented().is_empty());
    }

    #[tokio::test]
    async fn test_session_with_all_channels_degraded_still_closes() {
        let fx = fixture();
        for entity in WatchedEntity::ALL {
            fx.transport.fail_opens_for(entity);
        }

        let handle = fx.session.open(&TenantId::new("hosp-1").unwrap()).await;
        assert_eq!(handle.channel_count(), 0);
        assert_eq!(handle.degraded().len(), 4);

        let summary = fx.session.close(handle).await;
        assert_eq!(summary.closed, 0);
        assert_eq!(summary.degraded.len(), 4);
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_consuming() {
        let fx = fixture();
        let handle = fx.session.open(&TenantId::new("hosp-1").unwrap()).await;
        drop(handle);

        // Once the aborted consumer is gone its receivers are dropped too
        let queue_insert = || event(WatchedEntity::QueueEntry, json!({"id": "q-1", "hospital_id": "hosp-1"}));
        tokio::time::timeout(Duration::from_secs(5), async {
            while fx.transport.publish(queue_insert()).await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(fx.transport.open_channel_count(), 4);
    }

    #[tokio::test]
    async fn test_restricted_entities() {
        let fx = fixture();
        let session = fx.session.with_entities(&[WatchedEntity::LabOrder]);
        let tenant = TenantId::new("hosp-5").unwrap();

        let plan = session.plan(&tenant);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].filter(), "hospital_id=eq.hosp-5");

        let handle = session.open(&tenant).await;
        assert_eq!(fx.transport.open_channel_count(), 1);
        session.close(handle).await;
        assert_eq!(fx.transport.open_channel_count(), 0);
    }
}
