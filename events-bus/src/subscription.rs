//! Opens and closes the per-entity channels of one tenant

use std::sync::Arc;

use error_common::{codes, log_error, ErrorContext, HimsError};
use tracing::{info, warn};

use crate::entity::WatchedEntity;
use crate::tenant::TenantId;
use crate::transport::{ChangeStream, ChannelHandle, ChannelSpec, RealtimeTransport};

/// Entity whose channel failed to open; it simply delivers no events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedChannel {
    pub entity: WatchedEntity,
    pub reason: String,
}

/// Result of [`SubscriptionManager::open_all`]
///
/// Opening is not atomic: every handle that was obtained is returned and must
/// be closed, even when some of its siblings failed.
#[derive(Default)]
pub struct OpenedChannels {
    pub handles: Vec<ChannelHandle>,
    pub streams: Vec<(WatchedEntity, ChangeStream)>,
    pub degraded: Vec<DegradedChannel>,
}

impl OpenedChannels {
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty() && self.degraded.is_empty()
    }
}

pub struct SubscriptionManager {
    transport: Arc<dyn RealtimeTransport>,
    tenant_field: String,
}

impl SubscriptionManager {
    pub fn new(transport: Arc<dyn RealtimeTransport>, tenant_field: impl Into<String>) -> Self {
        Self {
            transport,
            tenant_field: tenant_field.into(),
        }
    }

    /// Channel specs `open_all` would request for `tenant`, duplicates removed
    pub fn plan(&self, tenant: &TenantId, entities: &[WatchedEntity]) -> Vec<ChannelSpec> {
        let mut specs: Vec<ChannelSpec> = Vec::with_capacity(entities.len());
        for &entity in entities {
            if specs.iter().any(|s| s.entity == entity) {
                continue;
            }
            specs.push(ChannelSpec::new(entity, tenant.clone(), self.tenant_field.clone()));
        }
        specs
    }

    /// Open one channel per entity, filtered to `tenant`
    ///
    /// Without a tenant nothing is opened: an unscoped channel would receive
    /// every hospital's rows.
    pub async fn open_all(&self, tenant: Option<&TenantId>, entities: &[WatchedEntity]) -> OpenedChannels {
        let Some(tenant) = tenant else {
            warn!(
                code = codes::validation::MISSING_TENANT,
                "Refusing to open realtime channels without a tenant"
            );
            return OpenedChannels::default();
        };

        let mut opened = OpenedChannels::default();
        for spec in self.plan(tenant, entities) {
            match self.transport.open_channel(&spec).await {
                Ok((handle, stream)) => {
                    opened.streams.push((spec.entity, stream));
                    opened.handles.push(handle);
                }
                Err(e) => {
                    warn!(
                        tenant_id = %tenant,
                        table = spec.table(),
                        code = e.code(),
                        error = %e,
                        "Realtime channel degraded, no live updates for this table"
                    );
                    opened.degraded.push(DegradedChannel {
                        entity: spec.entity,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            tenant_id = %tenant,
            opened = opened.handles.len(),
            degraded = opened.degraded.len(),
            "Realtime channels opened"
        );
        opened
    }

    /// Close every handle; failures are logged, never propagated
    pub async fn close_all(&self, tenant: &TenantId, handles: Vec<ChannelHandle>) -> usize {
        let mut closed = 0;
        for handle in handles {
            let channel_id = handle.id();
            let table = handle.entity().table();
            match self.transport.close_channel(handle).await {
                Ok(()) => closed += 1,
                Err(e) => {
                    let context = close_failure_context(tenant, &channel_id.to_string(), table, e.code());
                    log_error("close_channel", &HimsError::from(e).with_context(context));
                }
            }
        }
        closed
    }
}

fn close_failure_context(tenant: &TenantId, channel_id: &str, table: &str, code: &str) -> ErrorContext {
    ErrorContext::new()
        .with_tenant_id(tenant.to_string())
        .with_channel_id(channel_id.to_string())
        .with_table(table.to_string())
        .add_context("code", code)
}
