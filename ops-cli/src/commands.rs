// Command implementations, kept free of terminal output so they can be tested
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use config_engine::RealtimeConfig;
use events_bus::{
    channel_subject, connect_transport, ChangeEvent, ChannelSpec, InMemoryTransport,
    LifecycleController, LifecycleState, Notification, NotificationSink, RecordingSink,
    SessionSummary, SubscriptionSession, TenantContext, TenantId, WatchedEntity,
};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::console::{ConsoleSink, TracingCache};

const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(10);

/// One channel a session would open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRow {
    pub table: &'static str,
    pub filter: String,
    pub cache_keys: Vec<&'static str>,
    /// `None` when the tenant cannot be expressed as a NATS subject token
    pub subject: Option<String>,
}

pub fn channels(config: &RealtimeConfig, tenant: &TenantId) -> Vec<ChannelRow> {
    WatchedEntity::ALL
        .iter()
        .map(|entity| {
            let spec = ChannelSpec::new(*entity, tenant.clone(), config.session.tenant_field.clone());
            ChannelRow {
                table: spec.table(),
                filter: spec.filter(),
                cache_keys: entity.cache_keys().iter().map(|key| key.as_str()).collect(),
                subject: channel_subject(&config.transport.subject_prefix, &spec).ok(),
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct ReplayReport {
    /// Non-blank lines read from the events file
    pub lines: usize,
    /// Lines that did not decode into a change event
    pub skipped: usize,
    /// Events that reached one of the tenant's channels
    pub delivered: usize,
    pub notifications: Vec<Notification>,
    pub summaries: Vec<SessionSummary>,
}

/// Decode a JSON Lines document, skipping blank and malformed lines
pub fn parse_events(content: &str) -> (Vec<ChangeEvent>, usize, usize) {
    let mut events = Vec::new();
    let mut lines = 0;
    let mut skipped = 0;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines += 1;
        match ChangeEvent::from_slice(line.as_bytes()) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed change event");
                skipped += 1;
            }
        }
    }

    (events, lines, skipped)
}

/// Run a full session on the in-memory transport over the given events file
pub async fn replay(
    config: &RealtimeConfig,
    tenant: TenantId,
    events_path: &Path,
) -> anyhow::Result<ReplayReport> {
    let content = tokio::fs::read_to_string(events_path)
        .await
        .with_context(|| format!("failed to read events file {}", events_path.display()))?;
    let (events, lines, skipped) = parse_events(&content);

    let transport = Arc::new(InMemoryTransport::new(config.session.channel_buffer));
    let sink = Arc::new(RecordingSink::default());
    let session = SubscriptionSession::new(
        transport.clone(),
        Arc::new(TracingCache),
        sink.clone(),
        config,
    );

    let tenants = TenantContext::new();
    let controller = LifecycleController::new(session, &tenants);
    let state = controller.watch_state();
    let (unmount_tx, unmount_rx) = oneshot::channel::<()>();
    let view = tokio::spawn(controller.run(async move {
        let _ = unmount_rx.await;
    }));

    tenants.login(tenant.clone());
    wait_until_active(state, &tenant).await?;

    let mut delivered = 0;
    for event in events {
        delivered += transport.publish(event).await;
    }
    info!(tenant_id = %tenant, lines, skipped, delivered, "Replay published");

    let _ = unmount_tx.send(());
    let summaries = view.await.context("lifecycle task failed")?;

    Ok(ReplayReport {
        lines,
        skipped,
        delivered,
        notifications: sink.presented(),
        summaries,
    })
}

/// Attach to the configured transport until `shutdown` resolves
pub async fn watch<F>(
    config: &RealtimeConfig,
    tenant: TenantId,
    shutdown: F,
) -> anyhow::Result<Vec<SessionSummary>>
where
    F: std::future::Future<Output = ()>,
{
    let transport = connect_transport(&config.transport, config.session.channel_buffer)
        .await
        .context("failed to connect realtime transport")?;
    let sink: Arc<dyn NotificationSink> = Arc::new(ConsoleSink);
    let session = SubscriptionSession::new(transport, Arc::new(TracingCache), sink, config);

    let tenants = TenantContext::new();
    tenants.login(tenant);
    let controller = LifecycleController::new(session, &tenants);
    let summaries = controller.run(shutdown).await;
    Ok(summaries)
}

async fn wait_until_active(
    mut state: watch::Receiver<LifecycleState>,
    tenant: &TenantId,
) -> anyhow::Result<()> {
    timeout(ACTIVATION_TIMEOUT, state.wait_for(|s| s.is_active_for(tenant)))
        .await
        .context("realtime session did not become active")?
        .context("lifecycle controller stopped before activation")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use events_bus::Severity;
    use std::io::Write;

    fn tenant(raw: &str) -> TenantId {
        TenantId::new(raw).unwrap()
    }

    #[test]
    fn test_channels_cover_every_entity_scoped_to_tenant() {
        let rows = channels(&RealtimeConfig::default(), &tenant("hosp-123"));

        assert_eq!(rows.len(), WatchedEntity::ALL.len());
        assert!(rows.iter().all(|row| row.filter == "hospital_id=eq.hosp-123"));

        let queue = rows.iter().find(|row| row.table == "queue_entries").unwrap();
        assert_eq!(queue.cache_keys, vec!["queue", "patient-stats"]);
        assert_eq!(
            queue.subject.as_deref(),
            Some("realtime.queue_entries.hospital_id.hosp-123")
        );
    }

    #[test]
    fn test_channels_without_subject_for_dotted_tenant() {
        let rows = channels(&RealtimeConfig::default(), &tenant("hosp.1"));
        assert!(rows.iter().all(|row| row.subject.is_none()));
        assert!(rows.iter().all(|row| row.filter == "hospital_id=eq.hosp.1"));
    }

    #[test]
    fn test_parse_events_skips_malformed_lines() {
        let content = r#"
{"eventKind":"INSERT","table":"queue_entries","newRecord":{"id":"q-1","hospital_id":"hosp-1"}}
not json

{"eventKind":"INSERT","table":"beds","newRecord":{"id":"b-1"}}
"#;
        let (events, lines, skipped) = parse_events(content);
        assert_eq!(lines, 3);
        assert_eq!(skipped, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity, WatchedEntity::QueueEntry);
    }

    #[tokio::test]
    async fn test_replay_presents_tenant_notifications_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let lines = [
            r#"{"eventKind":"INSERT","table":"queue_entries","newRecord":{"id":"q-1","hospital_id":"hosp-1"}}"#,
            r#"{"eventKind":"INSERT","table":"queue_entries","newRecord":{"id":"q-2","hospital_id":"hosp-2"}}"#,
            r#"{"eventKind":"INSERT","table":"critical_alerts","newRecord":{"id":"a-1","hospital_id":"hosp-1","message":"Code blue"}}"#,
            r#"{"eventKind":"INSERT","table":"critical_alerts","newRecord":{"id":"a-1","hospital_id":"hosp-1","message":"Code blue"}}"#,
            r#"garbage"#,
        ];
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }

        let report = replay(&RealtimeConfig::default(), tenant("hosp-1"), file.path())
            .await
            .unwrap();

        assert_eq!(report.lines, 5);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.delivered, 3);

        let messages: Vec<_> = report
            .notifications
            .iter()
            .map(|n| (n.severity, n.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![
                (Severity::Info, "New patient added to queue"),
                (Severity::Critical, "Critical alert: Code blue"),
            ]
        );

        assert_eq!(report.summaries.len(), 1);
        let summary = &report.summaries[0];
        assert_eq!(summary.opened, WatchedEntity::ALL.len());
        assert_eq!(summary.closed, summary.opened);
        assert_eq!(summary.stats.events_received, 3);
        assert_eq!(summary.stats.notifications_shown, 2);
        assert_eq!(summary.stats.notifications_suppressed, 1);
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_an_error() {
        let result = replay(
            &RealtimeConfig::default(),
            tenant("hosp-1"),
            Path::new("/nonexistent/changes.jsonl"),
        )
        .await;
        assert!(result.is_err());
    }
}
