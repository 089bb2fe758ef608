//! Watched entity types and their static wiring
//!
//! Each variant carries the table it mirrors, the cache keys a change to it
//! invalidates, and the toast rule (if any) it raises.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{ChangeEvent, ChangeKind};

/// Logical identity of a previously fetched result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(&'static str);

impl CacheKey {
    pub const QUEUE: CacheKey = CacheKey("queue");
    pub const PATIENT_STATS: CacheKey = CacheKey("patient-stats");
    pub const LAB_ORDERS: CacheKey = CacheKey("lab-orders");
    pub const PRESCRIPTIONS: CacheKey = CacheKey("prescriptions");
    pub const PHARMACY_QUEUE: CacheKey = CacheKey("pharmacy-queue");
    pub const CRITICAL_ALERTS: CacheKey = CacheKey("critical-alerts");

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Toast severity, ordered by urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// When a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Any insert
    OnInsert,
    /// Update whose new record has `status` equal to the given value
    OnStatus(&'static str),
}

/// Toast rule attached to an entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationRule {
    pub trigger: Trigger,
    /// Message with `{field}` placeholders filled from the changed record
    pub template: &'static str,
    pub severity: Severity,
    pub duration_ms: u64,
    /// Record field whose value identifies duplicate deliveries
    pub dedupe_field: Option<&'static str>,
}

impl NotificationRule {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match self.trigger {
            Trigger::OnInsert => event.kind == ChangeKind::Insert,
            Trigger::OnStatus(status) => {
                event.kind == ChangeKind::Update
                    && event
                        .new_record
                        .as_ref()
                        .and_then(|record| record.get("status"))
                        .and_then(|value| value.as_str())
                        == Some(status)
            }
        }
    }
}

static QUEUE_RULE: NotificationRule = NotificationRule {
    trigger: Trigger::OnInsert,
    template: "New patient added to queue",
    severity: Severity::Info,
    duration_ms: 4_000,
    dedupe_field: None,
};

static LAB_RESULT_RULE: NotificationRule = NotificationRule {
    trigger: Trigger::OnStatus("completed"),
    template: "Lab results ready for patient {patient_id}",
    severity: Severity::Success,
    duration_ms: 5_000,
    dedupe_field: None,
};

static PRESCRIPTION_RULE: NotificationRule = NotificationRule {
    trigger: Trigger::OnInsert,
    template: "New prescription for patient {patient_id}",
    severity: Severity::Info,
    duration_ms: 4_000,
    dedupe_field: None,
};

static CRITICAL_ALERT_RULE: NotificationRule = NotificationRule {
    trigger: Trigger::OnInsert,
    template: "Critical alert: {message}",
    severity: Severity::Critical,
    duration_ms: 10_000,
    dedupe_field: Some("id"),
};

/// Record categories dashboards watch for live changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedEntity {
    QueueEntry,
    LabOrder,
    Prescription,
    CriticalAlert,
}

impl WatchedEntity {
    pub const ALL: [WatchedEntity; 4] = [
        WatchedEntity::QueueEntry,
        WatchedEntity::LabOrder,
        WatchedEntity::Prescription,
        WatchedEntity::CriticalAlert,
    ];

    pub const fn table(self) -> &'static str {
        match self {
            WatchedEntity::QueueEntry => "queue_entries",
            WatchedEntity::LabOrder => "lab_orders",
            WatchedEntity::Prescription => "prescriptions",
            WatchedEntity::CriticalAlert => "critical_alerts",
        }
    }

    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entity| entity.table() == table)
    }

    /// Keys invalidated by any change; the first is the entity's own key
    pub fn cache_keys(self) -> &'static [CacheKey] {
        match self {
            WatchedEntity::QueueEntry => &[CacheKey::QUEUE, CacheKey::PATIENT_STATS],
            WatchedEntity::LabOrder => &[CacheKey::LAB_ORDERS, CacheKey::PATIENT_STATS],
            WatchedEntity::Prescription => &[CacheKey::PRESCRIPTIONS, CacheKey::PHARMACY_QUEUE],
            WatchedEntity::CriticalAlert => &[CacheKey::CRITICAL_ALERTS],
        }
    }

    pub fn notification_rule(self) -> Option<&'static NotificationRule> {
        match self {
            WatchedEntity::QueueEntry => Some(&QUEUE_RULE),
            WatchedEntity::LabOrder => Some(&LAB_RESULT_RULE),
            WatchedEntity::Prescription => Some(&PRESCRIPTION_RULE),
            WatchedEntity::CriticalAlert => Some(&CRITICAL_ALERT_RULE),
        }
    }
}

impl fmt::Display for WatchedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}
