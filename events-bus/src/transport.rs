//! Seam to the realtime backend

use std::sync::Arc;

use async_trait::async_trait;
use config_engine::{TransportKind, TransportSettings};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::entity::WatchedEntity;
use crate::error::Result;
use crate::event::ChangeEvent;
use crate::memory::InMemoryTransport;
use crate::nats::NatsTransport;
use crate::tenant::TenantId;

/// Stream of change events for one open channel
pub type ChangeStream = ReceiverStream<ChangeEvent>;

/// What to subscribe to: one table, scoped to one tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub entity: WatchedEntity,
    pub tenant: TenantId,
    pub tenant_field: String,
}

impl ChannelSpec {
    pub fn new(entity: WatchedEntity, tenant: TenantId, tenant_field: impl Into<String>) -> Self {
        Self {
            entity,
            tenant,
            tenant_field: tenant_field.into(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.entity.table()
    }

    /// Row filter in the backend's `column=eq.value` syntax
    pub fn filter(&self) -> String {
        format!("{}=eq.{}", self.tenant_field, self.tenant)
    }
}

/// Live subscription reference
///
/// Deliberately not `Clone`: closing takes the handle by value, so each
/// handle can be closed exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct ChannelHandle {
    id: Uuid,
    entity: WatchedEntity,
    filter: String,
}

impl ChannelHandle {
    pub fn new(spec: &ChannelSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity: spec.entity,
            filter: spec.filter(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entity(&self) -> WatchedEntity {
        self.entity
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// Realtime backend able to open and close filtered change channels
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open a channel; events arrive on the returned stream until it is closed
    async fn open_channel(&self, spec: &ChannelSpec) -> Result<(ChannelHandle, ChangeStream)>;

    /// Close a channel opened by this transport
    async fn close_channel(&self, handle: ChannelHandle) -> Result<()>;
}

/// Build the transport selected by configuration
pub async fn connect_transport(
    settings: &TransportSettings,
    buffer: usize,
) -> Result<Arc<dyn RealtimeTransport>> {
    match settings.kind {
        TransportKind::Memory => Ok(Arc::new(InMemoryTransport::new(buffer))),
        TransportKind::Nats => Ok(Arc::new(NatsTransport::connect(settings, buffer).await?)),
    }
}
