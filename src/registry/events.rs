use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Payload delivered to subscribers when registrations change.
///
/// An empty region list means "any region may have changed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionsChanged {
    regions: Vec<String>,
}

impl RegionsChanged {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn is_global(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether a view bound to `region` has to reload.
    pub fn affects(&self, region: &str) -> bool {
        self.is_global() || self.regions.iter().any(|name| name == region)
    }
}

pub type RegionsChangedHandler = Arc<dyn Fn(&RegionsChanged) + Send + Sync>;

/// Handle returned by [`RegionEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Multicast observer list for [`RegionsChanged`].
#[derive(Default)]
pub struct RegionEvents {
    subscribers: Mutex<Vec<(SubscriptionId, RegionsChangedHandler)>>,
    next_id: AtomicU64,
}

impl RegionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&RegionsChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    /// Calls every current subscriber and returns how many were called.
    ///
    /// The subscriber lock is released before dispatch, so handlers may
    /// subscribe, unsubscribe or query the registry.
    pub fn emit(&self, event: &RegionsChanged) -> usize {
        let handlers: Vec<RegionsChangedHandler> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RegionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionEvents")
            .field("subscribers", &self.len())
            .finish()
    }
}
