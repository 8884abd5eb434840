use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::component::ComponentType;

use super::registration::ComponentRegistration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegistrationKey {
    region: String,
    component: ComponentType,
    key: String,
}

impl RegistrationKey {
    fn new(region: &str, component: ComponentType, key: &str) -> Self {
        Self {
            region: region.to_string(),
            component,
            key: key.to_string(),
        }
    }
}

/// Outcome of [`RegistrationIndex::remove`].
#[derive(Debug)]
pub(crate) enum Removal {
    UnknownRegion,
    Missing,
    Removed(ComponentRegistration),
}

/// Composite-key index over `(region, component, key)`.
///
/// `regions` keeps each region's keys in insertion order. A region bucket is
/// created by its first registration and survives after it empties, so
/// removals can tell an unknown region from a missing entry.
#[derive(Debug, Default)]
pub(crate) struct RegistrationIndex {
    entries: HashMap<RegistrationKey, ComponentRegistration>,
    regions: HashMap<String, Vec<RegistrationKey>>,
}

impl RegistrationIndex {
    /// Inserts unless the slot is taken; an occupied slot is left untouched.
    pub fn insert(&mut self, region: &str, registration: ComponentRegistration) -> bool {
        let composite = RegistrationKey::new(region, registration.component(), registration.key());
        let bucket = self.regions.entry(region.to_string()).or_default();
        match self.entries.entry(composite) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                bucket.push(vacant.key().clone());
                vacant.insert(registration);
                true
            }
        }
    }

    pub fn remove(&mut self, region: &str, component: ComponentType, key: &str) -> Removal {
        let Some(bucket) = self.regions.get_mut(region) else {
            return Removal::UnknownRegion;
        };
        let composite = RegistrationKey::new(region, component, key);
        match self.entries.remove(&composite) {
            Some(registration) => {
                bucket.retain(|existing| *existing != composite);
                Removal::Removed(registration)
            }
            None => Removal::Missing,
        }
    }

    pub fn region(&self, region: &str) -> Vec<ComponentRegistration> {
        self.regions
            .get(region)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter_map(|composite| self.entries.get(composite).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(
        &self,
        region: &str,
        component: ComponentType,
        key: &str,
    ) -> Option<&ComponentRegistration> {
        self.entries.get(&RegistrationKey::new(region, component, key))
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.regions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
