// Terminal rendering and the console-side cache/sink adapters
use colored::*;
use events_bus::{
    CacheKey, DataCache, Notification, NotificationSink, SessionSummary, Severity,
};
use tracing::debug;

use crate::commands::{ChannelRow, ReplayReport};

/// Prints each notification as it is presented
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn present(&self, notification: Notification) {
        println!("{}", format_notification(&notification));
    }
}

/// Cache stand-in for CLI sessions; there is no query layer to refetch, so
/// invalidations are only logged
#[derive(Debug, Default)]
pub struct TracingCache;

impl DataCache for TracingCache {
    fn invalidate(&self, key: &CacheKey) {
        debug!(cache_key = %key, "Cache invalidated");
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let label = format!("[{}]", notification.severity);
    let label = match notification.severity {
        Severity::Info => label.bright_cyan(),
        Severity::Success => label.bright_green(),
        Severity::Warning => label.bright_yellow(),
        Severity::Critical => label.bright_red().bold(),
    };
    format!(
        "{} {} ({} ms)",
        label, notification.message, notification.duration_ms
    )
}

pub fn print_channels(rows: &[ChannelRow]) {
    println!(
        "{:<16} {:<28} {:<34} {}",
        "TABLE".bold(),
        "FILTER".bold(),
        "CACHE KEYS".bold(),
        "SUBJECT".bold()
    );
    for row in rows {
        println!(
            "{:<16} {:<28} {:<34} {}",
            row.table,
            row.filter,
            row.cache_keys.join(","),
            row.subject.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_summary(summary: &SessionSummary) {
    println!(
        "🏥 {} {}",
        "Session".bright_cyan(),
        summary.tenant.to_string().bright_white()
    );
    println!("   channels opened:   {}", summary.opened);
    println!("   channels closed:   {}", summary.closed);
    for degraded in &summary.degraded {
        println!(
            "   {} {} ({})",
            "degraded:".bright_yellow(),
            degraded.entity,
            degraded.reason
        );
    }
    println!("   events received:   {}", summary.stats.events_received);
    println!("   invalidations:     {}", summary.stats.invalidations);
    println!("   toasts shown:      {}", summary.stats.notifications_shown);
    println!(
        "   toasts suppressed: {}",
        summary.stats.notifications_suppressed
    );
}

pub fn print_replay(report: &ReplayReport) {
    println!(
        "📋 {} lines, {} skipped, {} delivered to the tenant's channels",
        report.lines, report.skipped, report.delivered
    );
    for notification in &report.notifications {
        println!("{}", format_notification(notification));
    }
    for summary in &report.summaries {
        print_summary(summary);
    }
}
