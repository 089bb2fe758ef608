//! NATS-backed realtime transport
//!
//! The database's change feed is bridged onto NATS subjects of the form
//! `<prefix>.<table>.<tenant_field>.<tenant_id>`, so the tenant filter is
//! enforced by subject matching on the server. Each open channel owns a
//! forwarding task that decodes JSON change messages into the channel's
//! stream; closing the channel aborts the task, which drops the subscription.

use std::collections::HashMap;

use async_trait::async_trait;
use config_engine::TransportSettings;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{RealtimeError, Result};
use crate::event::ChangeEvent;
use crate::transport::{ChangeStream, ChannelHandle, ChannelSpec, RealtimeTransport};

pub struct NatsTransport {
    client: async_nats::Client,
    subject_prefix: String,
    buffer: usize,
    forwarders: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl NatsTransport {
    pub async fn connect(settings: &TransportSettings, buffer: usize) -> Result<Self> {
        let url = settings
            .nats_url
            .as_deref()
            .ok_or_else(|| RealtimeError::BrokerConnectionError("nats_url is not set".to_string()))?;

        info!("Connecting realtime transport to NATS server: {}", url);
        let client = async_nats::connect(url)
            .await
            .map_err(|e| RealtimeError::BrokerConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            subject_prefix: settings.subject_prefix.clone(),
            buffer: buffer.max(1),
            forwarders: Mutex::new(HashMap::new()),
        })
    }

    pub fn subject_for(&self, spec: &ChannelSpec) -> Result<String> {
        channel_subject(&self.subject_prefix, spec)
    }
}

/// Subject a channel listens on; tenant ids that would widen the subject are refused
pub fn channel_subject(prefix: &str, spec: &ChannelSpec) -> Result<String> {
    let tenant = spec.tenant.as_str();
    let unsafe_token = |token: &str| token.contains(&['.', '*', '>'][..]) || token.contains(char::is_whitespace);

    if unsafe_token(tenant) || unsafe_token(&spec.tenant_field) {
        return Err(RealtimeError::ChannelOpenFailed {
            table: spec.table(),
            reason: format!("tenant scope '{}={}' is not a valid subject token", spec.tenant_field, tenant),
        });
    }

    Ok(format!("{prefix}.{}.{}.{tenant}", spec.table(), spec.tenant_field))
}

#[async_trait]
impl RealtimeTransport for NatsTransport {
    async fn open_channel(&self, spec: &ChannelSpec) -> Result<(ChannelHandle, ChangeStream)> {
        let subject = self.subject_for(spec)?;
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| RealtimeError::ChannelOpenFailed {
                table: spec.table(),
                reason: e.to_string(),
            })?;

        let handle = ChannelHandle::new(spec);
        let (sender, receiver) = mpsc::channel(self.buffer);
        let expected = spec.entity;
        let channel_id = handle.id();

        let forwarder = tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let event = match ChangeEvent::from_slice(&message.payload) {
                    Ok(event) if event.entity == expected => event,
                    Ok(event) => {
                        warn!(%channel_id, table = event.entity.table(), "Dropping change event for a different table");
                        continue;
                    }
                    Err(e) => {
                        warn!(%channel_id, code = e.code(), error = %e, "Dropping malformed change event");
                        continue;
                    }
                };

                if sender.send(event).await.is_err() {
                    debug!(%channel_id, "Channel consumer gone, stopping forwarder");
                    break;
                }
            }
        });

        self.forwarders.lock().insert(channel_id, forwarder);
        info!(%channel_id, subject = %subject, "Opened NATS channel");

        Ok((handle, ReceiverStream::new(receiver)))
    }

    async fn close_channel(&self, handle: ChannelHandle) -> Result<()> {
        match self.forwarders.lock().remove(&handle.id()) {
            Some(forwarder) => {
                forwarder.abort();
                debug!(channel_id = %handle.id(), "Closed NATS channel");
                Ok(())
            }
            None => Err(RealtimeError::ChannelCloseFailed {
                channel_id: handle.id().to_string(),
                reason: "no forwarder registered".to_string(),
            }),
        }
    }
}
