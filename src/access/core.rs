use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::component::ComponentType;

/// Authorization requirement a component declares through [`Component::access`].
///
/// An empty requirement only demands an authenticated principal.
///
/// [`Component::access`]: crate::component::Component::access
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    pub roles: Vec<String>,
    pub policy: Option<String>,
}

impl AccessRequirement {
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Comma separated role list, any one of which grants access.
    pub fn roles(roles: &str) -> Self {
        Self {
            roles: roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect(),
            policy: None,
        }
    }

    pub fn policy(policy: impl Into<String>) -> Self {
        Self {
            roles: Vec::new(),
            policy: Some(policy.into()),
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }
}

/// Decides whether the current user may see a component with a requirement.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, requirement: &AccessRequirement) -> bool;
}

/// Snapshot of the signed-in user used as the default [`Authorizer`].
#[derive(Debug, Clone, Default)]
pub struct Principal {
    authenticated: bool,
    roles: HashSet<String>,
    policies: HashSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policies.insert(policy.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl Authorizer for Principal {
    fn is_authorized(&self, requirement: &AccessRequirement) -> bool {
        if !self.authenticated {
            return false;
        }
        if !requirement.roles.is_empty()
            && !requirement.roles.iter().any(|role| self.roles.contains(role))
        {
            return false;
        }
        match &requirement.policy {
            Some(policy) => self.policies.contains(policy),
            None => true,
        }
    }
}

/// Process-wide memo of each component type's access requirement.
///
/// Absence of a requirement is cached as well, so every type is evaluated once.
#[derive(Debug, Default)]
pub struct AccessCache {
    entries: RwLock<HashMap<ComponentType, Option<Arc<AccessRequirement>>>>,
}

impl AccessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requirement(&self, component: ComponentType) -> Option<Arc<AccessRequirement>> {
        {
            let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = guard.get(&component) {
                return cached.clone();
            }
        }
        let resolved = component.access_requirement().map(Arc::new);
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.entry(component).or_insert(resolved).clone()
    }

    pub fn is_cached(&self, component: ComponentType) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&component)
    }

    /// Checks `component` against `authorizer`; a missing authorizer only
    /// admits components without a requirement.
    pub fn permits(&self, component: ComponentType, authorizer: Option<&dyn Authorizer>) -> bool {
        match self.requirement(component) {
            None => true,
            Some(requirement) => authorizer
                .map(|auth| auth.is_authorized(&requirement))
                .unwrap_or(false),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
