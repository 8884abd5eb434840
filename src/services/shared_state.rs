use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

/// Type-keyed resource map. Each type appears at most once; clones share
/// the same storage.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_arc<T>(&self, value: Arc<T>) -> Result<(), SharedStateError>
    where
        T: Send + Sync + 'static,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let type_id = TypeId::of::<T>();
        if guard.contains_key(&type_id) {
            return Err(SharedStateError::AlreadyExists(type_name::<T>()));
        }
        guard.insert(type_id, Box::new(value));
        Ok(())
    }

    pub fn get<T>(&self) -> Result<Arc<T>, SharedStateError>
    where
        T: Send + Sync + 'static,
    {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let boxed = guard
            .get(&TypeId::of::<T>())
            .ok_or(SharedStateError::Missing(type_name::<T>()))?;
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(SharedStateError::TypeMismatch(type_name::<T>()))
    }

    /// Returns the stored value, creating it with `make` on first use. Racing
    /// initialisers agree on whichever value was stored first.
    pub fn get_or_insert_with<T, F>(&self, make: F) -> Result<Arc<T>, SharedStateError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Ok(value) = self.get::<T>() {
            return Ok(value);
        }
        let value = Arc::new(make());
        {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            guard
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Box::new(value));
        }
        self.get::<T>()
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }
}

#[derive(Debug, Error)]
pub enum SharedStateError {
    #[error("service `{0}` already exists")]
    AlreadyExists(&'static str),
    #[error("service `{0}` is not registered")]
    Missing(&'static str),
    #[error("service `{0}` has an unexpected type")]
    TypeMismatch(&'static str),
}
