//! In-process realtime backend
//!
//! Emulates the server side of the realtime service: it keeps the open
//! channels, applies each channel's tenant filter when events are published,
//! and records every open/close call so callers can assert on ordering.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::WatchedEntity;
use crate::error::{RealtimeError, Result};
use crate::event::ChangeEvent;
use crate::transport::{ChangeStream, ChannelHandle, ChannelSpec, RealtimeTransport};

/// Outbound call observed by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Open {
        channel_id: Uuid,
        table: &'static str,
        filter: String,
    },
    Close {
        channel_id: Uuid,
        table: &'static str,
    },
}

#[derive(Debug)]
struct OpenChannel {
    entity: WatchedEntity,
    tenant_field: String,
    tenant: String,
    sender: mpsc::Sender<ChangeEvent>,
}

#[derive(Debug)]
pub struct InMemoryTransport {
    buffer: usize,
    channels: Mutex<HashMap<Uuid, OpenChannel>>,
    calls: Mutex<Vec<TransportCall>>,
    failing: Mutex<HashSet<WatchedEntity>>,
}

impl InMemoryTransport {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            channels: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make subsequent opens for `entity` fail
    pub fn fail_opens_for(&self, entity: WatchedEntity) {
        self.failing.lock().insert(entity);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn open_channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Filters of the channels currently open, sorted
    pub fn open_filters(&self) -> Vec<(&'static str, String)> {
        let mut filters: Vec<_> = self
            .channels
            .lock()
            .values()
            .map(|c| (c.entity.table(), format!("{}=eq.{}", c.tenant_field, c.tenant)))
            .collect();
        filters.sort();
        filters
    }

    /// Deliver `event` to every open channel on its table whose tenant filter
    /// matches the row; returns the number of channels reached
    pub async fn publish(&self, event: ChangeEvent) -> usize {
        let targets: Vec<mpsc::Sender<ChangeEvent>> = self
            .channels
            .lock()
            .values()
            .filter(|c| c.entity == event.entity && event.tenant(&c.tenant_field) == Some(c.tenant.as_str()))
            .map(|c| c.sender.clone())
            .collect();

        let mut delivered = 0;
        for sender in targets {
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }

        debug!(
            table = event.entity.table(),
            kind = ?event.kind,
            delivered,
            "Published change event"
        );
        delivered
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl RealtimeTransport for InMemoryTransport {
    async fn open_channel(&self, spec: &ChannelSpec) -> Result<(ChannelHandle, ChangeStream)> {
        let handle = ChannelHandle::new(spec);
        self.calls.lock().push(TransportCall::Open {
            channel_id: handle.id(),
            table: spec.table(),
            filter: spec.filter(),
        });

        if self.failing.lock().contains(&spec.entity) {
            return Err(RealtimeError::ChannelOpenFailed {
                table: spec.table(),
                reason: "subscription rejected".to_string(),
            });
        }

        let (sender, receiver) = mpsc::channel(self.buffer);
        self.channels.lock().insert(
            handle.id(),
            OpenChannel {
                entity: spec.entity,
                tenant_field: spec.tenant_field.clone(),
                tenant: spec.tenant.to_string(),
                sender,
            },
        );

        info!(channel_id = %handle.id(), table = spec.table(), filter = %spec.filter(), "Opened in-memory channel");
        Ok((handle, ReceiverStream::new(receiver)))
    }

    async fn close_channel(&self, handle: ChannelHandle) -> Result<()> {
        self.calls.lock().push(TransportCall::Close {
            channel_id: handle.id(),
            table: handle.entity().table(),
        });

        match self.channels.lock().remove(&handle.id()) {
            Some(_) => Ok(()),
            None => Err(RealtimeError::ChannelCloseFailed {
                channel_id: handle.id().to_string(),
                reason: "channel is not open".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantId;
    use serde_json::json;
    use tokio_stream::StreamExt;

    fn spec(entity: WatchedEntity, tenant: &str) -> ChannelSpec {
        ChannelSpec::new(entity, TenantId::new(tenant).unwrap(), "hospital_id")
    }

    fn queue_insert(tenant: &str) -> ChangeEvent {
        ChangeEvent::insert(
            WatchedEntity::QueueEntry,
            json!({"id": "q-1", "hospital_id": tenant}).as_object().cloned().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_publish_respects_tenant_filter() {
        let transport = InMemoryTransport::new(8);
        let (_h1, mut ours) = transport
            .open_channel(&spec(WatchedEntity::QueueEntry, "hosp-1"))
            .await
            .unwrap();
        let (_h2, _theirs) = transport
            .open_channel(&spec(WatchedEntity::QueueEntry, "hosp-2"))
            .await
            .unwrap();

        assert_eq!(transport.publish(queue_insert("hosp-1")).await, 1);
        assert_eq!(transport.publish(queue_insert("hosp-3")).await, 0);

        let received = ours.next().await.unwrap();
        assert_eq!(received.tenant("hospital_id"), Some("hosp-1"));
    }

    #[tokio::test]
    async fn test_close_ends_stream_and_is_recorded() {
        let transport = InMemoryTransport::new(8);
        let (handle, mut stream) = transport
            .open_channel(&spec(WatchedEntity::LabOrder, "hosp-1"))
            .await
            .unwrap();
        let id = handle.id();

        transport.close_channel(handle).await.unwrap();
        assert!(stream.next().await.is_none());
        assert_eq!(transport.open_channel_count(), 0);
        assert!(matches!(
            transport.calls().last(),
            Some(TransportCall::Close { channel_id, .. }) if *channel_id == id
        ));
    }

    #[tokio::test]
    async fn test_failing_open_is_still_recorded() {
        let transport = InMemoryTransport::new(8);
        transport.fail_opens_for(WatchedEntity::Prescription);

        let result = transport
            .open_channel(&spec(WatchedEntity::Prescription, "hosp-1"))
            .await;
        assert!(matches!(result, Err(RealtimeError::ChannelOpenFailed { table: "prescriptions", .. })));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.open_channel_count(), 0);
    }
}
