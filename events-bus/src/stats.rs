//! Per-session counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct SessionStats {
    events_received: AtomicU64,
    invalidations: AtomicU64,
    notifications_shown: AtomicU64,
    notifications_suppressed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub events_received: u64,
    pub invalidations: u64,
    pub notifications_shown: u64,
    pub notifications_suppressed: u64,
}

impl SessionStats {
    pub fn record_event(&self, invalidations: usize) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        self.invalidations
            .fetch_add(u64::try_from(invalidations).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub fn record_shown(&self) {
        self.notifications_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed(&self) {
        self.notifications_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            notifications_shown: self.notifications_shown.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
        }
    }
}
