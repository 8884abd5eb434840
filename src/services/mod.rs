//! Service scopes for wiring registries into a host application.
//!
//! A root scope owns process-wide singletons; each [`ServiceScope::create_scope`]
//! call starts a session with its own scoped services while sharing those
//! singletons. Every scope gets exactly one [`RegionRegistry`] and all scopes
//! share one [`AccessCache`].

mod shared_state;

use std::sync::Arc;

use crate::access::AccessCache;
use crate::registry::{RegionRegistry, RegistryConfig};

pub use self::shared_state::{SharedState, SharedStateError};

#[derive(Clone, Default)]
pub struct ServiceScope {
    singletons: SharedState,
    scoped: SharedState,
    registry_config: Option<RegistryConfig>,
}

impl ServiceScope {
    pub fn root() -> Self {
        Self::default()
    }

    /// Configuration applied to registries created by this scope and its children.
    pub fn with_registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = Some(config);
        self
    }

    /// New session sharing this scope's singletons.
    pub fn create_scope(&self) -> Self {
        Self {
            singletons: self.singletons.clone(),
            scoped: SharedState::new(),
            registry_config: self.registry_config.clone(),
        }
    }

    pub fn singleton<T, F>(&self, make: F) -> Result<Arc<T>, SharedStateError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.singletons.get_or_insert_with(make)
    }

    pub fn scoped<T, F>(&self, make: F) -> Result<Arc<T>, SharedStateError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.scoped.get_or_insert_with(make)
    }

    pub fn singletons(&self) -> &SharedState {
        &self.singletons
    }

    pub fn scoped_state(&self) -> &SharedState {
        &self.scoped
    }
}

/// The scope's region registry, created on first use.
pub fn region_registry(scope: &ServiceScope) -> Result<Arc<RegionRegistry>, SharedStateError> {
    let config = scope.registry_config.clone().unwrap_or_default();
    scope.scoped(|| RegionRegistry::with_config(config))
}

/// The process-wide access requirement cache.
pub fn access_cache(scope: &ServiceScope) -> Result<Arc<AccessCache>, SharedStateError> {
    scope.singleton(AccessCache::new)
}
