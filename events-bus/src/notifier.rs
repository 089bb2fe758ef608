//! Transient user-facing notifications raised by change events

use std::sync::Arc;
use std::time::Duration;

use config_engine::NotificationSettings;
use lazy_static::lazy_static;
use moka::sync::Cache;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::entity::{NotificationRule, Severity};
use crate::event::ChangeEvent;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap();
}

/// Toast handed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
}

/// UI surface that displays notifications; fire-and-forget
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn present(&self, notification: Notification);
}

/// What the presenter did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Shown(Notification),
    /// Same dedupe key already shown within the dedupe window
    Suppressed(String),
    /// Rule predicate not satisfied, or entity has no rule
    Skipped,
}

pub struct NotificationPresenter {
    sink: Arc<dyn NotificationSink>,
    seen: Cache<String, ()>,
}

impl NotificationPresenter {
    pub fn new(sink: Arc<dyn NotificationSink>, settings: &NotificationSettings) -> Self {
        let seen = Cache::builder()
            .max_capacity(settings.dedupe_capacity)
            .time_to_live(Duration::from_secs(settings.dedupe_ttl_seconds))
            .build();
        Self { sink, seen }
    }

    /// Apply the event's own entity rule
    pub fn notify(&self, event: &ChangeEvent) -> Presentation {
        match event.entity.notification_rule() {
            Some(rule) => self.maybe_notify(event, rule),
            None => Presentation::Skipped,
        }
    }

    pub fn maybe_notify(&self, event: &ChangeEvent, rule: &NotificationRule) -> Presentation {
        if !rule.matches(event) {
            return Presentation::Skipped;
        }

        let dedupe_key = rule
            .dedupe_field
            .and_then(|field| event.field(field))
            .map(|value| format!("{}:{}", event.entity.table(), render_value(value)));

        if let Some(key) = &dedupe_key {
            let entry = self.seen.entry(key.clone()).or_insert(());
            if !entry.is_fresh() {
                debug!(dedupe_key = %key, "Suppressing duplicate notification");
                return Presentation::Suppressed(key.clone());
            }
        }

        let notification = Notification {
            message: render_template(rule.template, event),
            severity: rule.severity,
            duration_ms: rule.duration_ms,
            dedupe_key,
        };
        self.sink.present(notification.clone());
        Presentation::Shown(notification)
    }
}

/// Fill `{field}` placeholders from the event's records
pub fn render_template(template: &str, event: &ChangeEvent) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            event
                .field(&caps[1])
                .map_or_else(|| "unknown".to_string(), render_value)
        })
        .into_owned()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}

/// Sink that keeps every presented notification, for replays and tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    presented: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn presented(&self) -> Vec<Notification> {
        self.presented.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn present(&self, notification: Notification) {
        self.presented.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::WatchedEntity;
    use crate::event::Record;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn presenter(sink: Arc<dyn NotificationSink>) -> NotificationPresenter {
        NotificationPresenter::new(sink, &NotificationSettings::default())
    }

    #[test]
    fn test_queue_insert_shows_info_toast() {
        let mut sink = MockNotificationSink::new();
        sink.expect_present()
            .withf(|n| n.message == "New patient added to queue" && n.severity == Severity::Info)
            .times(1)
            .return_const(());

        let presenter = presenter(Arc::new(sink));
        let event = ChangeEvent::insert(WatchedEntity::QueueEntry, record(json!({"id": "q-1"})));
        assert!(matches!(presenter.notify(&event), Presentation::Shown(_)));
    }

    #[test]
    fn test_queue_update_is_silent() {
        let mut sink = MockNotificationSink::new();
        sink.expect_present().never();

        let presenter = presenter(Arc::new(sink));
        let event = ChangeEvent::update(
            WatchedEntity::QueueEntry,
            None,
            record(json!({"id": "q-1", "position": 2})),
        );
        assert_eq!(presenter.notify(&event), Presentation::Skipped);
    }

    #[test]
    fn test_completed_lab_mentions_patient() {
        let sink = Arc::new(RecordingSink::default());
        let presenter = presenter(sink.clone());
        let event = ChangeEvent::update(
            WatchedEntity::LabOrder,
            Some(record(json!({"status": "pending"}))),
            record(json!({"status": "completed", "patient_id": "pat-42"})),
        );

        presenter.notify(&event);
        let shown = sink.presented();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, "Lab results ready for patient pat-42");
        assert_eq!(shown[0].severity, Severity::Success);
        assert_eq!(shown[0].duration_ms, 5_000);
    }

    #[test]
    fn test_critical_alert_deduplicated_by_id() {
        let sink = Arc::new(RecordingSink::default());
        let presenter = presenter(sink.clone());
        let alert = ChangeEvent::insert(
            WatchedEntity::CriticalAlert,
            record(json!({"id": "alert-7", "message": "Code blue, ward 3"})),
        );

        assert!(matches!(presenter.notify(&alert), Presentation::Shown(_)));
        assert_eq!(
            presenter.notify(&alert),
            Presentation::Suppressed("critical_alerts:alert-7".to_string())
        );

        let other = ChangeEvent::insert(
            WatchedEntity::CriticalAlert,
            record(json!({"id": "alert-8", "message": "Sepsis risk, bed 12"})),
        );
        presenter.notify(&other);

        let shown = sink.presented();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].message, "Critical alert: Code blue, ward 3");
        assert_eq!(shown[0].severity, Severity::Critical);
        assert_eq!(shown[0].dedupe_key.as_deref(), Some("critical_alerts:alert-7"));
    }

    #[test]
    fn test_missing_placeholder_field_renders_unknown() {
        let event = ChangeEvent::insert(WatchedEntity::Prescription, record(json!({"id": "rx-1"})));
        assert_eq!(
            render_template("New prescription for patient {patient_id}", &event),
            "New prescription for patient unknown"
        );
    }

    #[test]
    fn test_numeric_placeholder_renders_plainly() {
        let event = ChangeEvent::insert(
            WatchedEntity::QueueEntry,
            record(json!({"token_number": 17})),
        );
        assert_eq!(render_template("Token {token_number}", &event), "Token 17");
    }
}
