use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Running counters for one registry instance.
#[derive(Debug, Default, Clone)]
pub struct RegistryMetrics {
    registrations: u64,
    rejected: u64,
    unregistrations: u64,
    notifications: u64,
    deliveries: u64,
}

impl RegistryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_registration(&mut self) {
        self.registrations = self.registrations.saturating_add(1);
    }

    pub fn record_rejected(&mut self) {
        self.rejected = self.rejected.saturating_add(1);
    }

    pub fn record_unregistration(&mut self) {
        self.unregistrations = self.unregistrations.saturating_add(1);
    }

    pub fn record_notification(&mut self, delivered: usize) {
        self.notifications = self.notifications.saturating_add(1);
        self.deliveries = self.deliveries.saturating_add(delivered as u64);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            registrations: self.registrations,
            rejected: self.rejected,
            unregistrations: self.unregistrations,
            notifications: self.notifications,
            deliveries: self.deliveries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub registrations: u64,
    pub rejected: u64,
    pub unregistrations: u64,
    pub notifications: u64,
    pub deliveries: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "registry_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("registrations".to_string(), json!(self.registrations));
        map.insert("rejected".to_string(), json!(self.rejected));
        map.insert("unregistrations".to_string(), json!(self.unregistrations));
        map.insert("notifications".to_string(), json!(self.notifications));
        map.insert("deliveries".to_string(), json!(self.deliveries));
        map
    }
}
