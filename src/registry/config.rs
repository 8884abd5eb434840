use std::sync::{Arc, Mutex};

use crate::logging::{Logger, METRICS_TARGET, REGISTRY_TARGET};
use crate::metrics::RegistryMetrics;

use super::audit::RegistryAudit;

/// Observability knobs for a [`RegionRegistry`](super::RegionRegistry).
#[derive(Clone)]
pub struct RegistryConfig {
    /// Optional structured logger used for registry events.
    pub logger: Option<Logger>,
    /// Metrics accumulator updated on every mutation and notification.
    pub metrics: Option<Arc<Mutex<RegistryMetrics>>>,
    /// Optional audit sink.
    pub audit: Option<Arc<dyn RegistryAudit>>,
    /// Target field used for registry log events.
    pub log_target: String,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: None,
            log_target: REGISTRY_TARGET.to_string(),
            metrics_target: METRICS_TARGET.to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn RegistryAudit>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(RegistryMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<RegistryMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("logger", &self.logger.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("audit", &self.audit.is_some())
            .field("log_target", &self.log_target)
            .field("metrics_target", &self.metrics_target)
            .finish()
    }
}
