//! Registry audit trail.
//!
//! Audit records capture each mutation and notification of a
//! [`RegionRegistry`](super::RegionRegistry) as a stage plus structured
//! details, so hosts can buffer, persist or display the history without
//! wrapping every call site.

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryAuditStage {
    /// A registration was inserted.
    Registered,
    /// A registration was refused because its key was taken.
    RegistrationRejected,
    /// A registration was removed.
    Unregistered,
    /// Subscribers were notified.
    RegionsChanged,
    /// A change handler subscribed.
    Subscribed,
    /// A change handler unsubscribed.
    Unsubscribed,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct RegistryAuditEvent {
    pub timestamp: SystemTime,
    pub stage: RegistryAuditStage,
    pub details: Vec<(String, Value)>,
}

impl RegistryAuditEvent {
    fn new(stage: RegistryAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct RegistryAuditEventBuilder {
    event: RegistryAuditEvent,
}

impl RegistryAuditEventBuilder {
    pub fn new(stage: RegistryAuditStage) -> Self {
        Self {
            event: RegistryAuditEvent::new(stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.details.push((key.into(), value.into()));
        self
    }

    pub fn finish(self) -> RegistryAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait RegistryAudit: Send + Sync {
    fn record(&self, event: RegistryAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullRegistryAudit;

impl RegistryAudit for NullRegistryAudit {
    fn record(&self, _event: RegistryAuditEvent) {}
}

/// Keeps audit entries in memory in arrival order.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<RegistryAuditEvent>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RegistryAuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<RegistryAuditStage> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|event| event.stage)
            .collect()
    }
}

impl RegistryAudit for MemoryAudit {
    fn record(&self, event: RegistryAuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
