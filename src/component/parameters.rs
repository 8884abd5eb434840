use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ParameterError;

use super::core::{Component, ComponentType, Property};

/// Shared, type-erased parameter value.
pub type ParameterValue = Arc<dyn Any + Send + Sync>;

/// Parameter map handed to a component when it is rendered.
///
/// Values are reference counted, so cloning a registration never copies them.
#[derive(Clone, Default)]
pub struct Parameters {
    values: BTreeMap<String, ParameterValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V>(mut self, name: impl Into<String>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert<V>(&mut self, name: impl Into<String>, value: V) -> Option<ParameterValue>
    where
        V: Any + Send + Sync,
    {
        self.values.insert(name.into(), Arc::new(value))
    }

    pub fn get<V: Any>(&self, name: &str) -> Option<&V> {
        self.values.get(name).and_then(|value| value.downcast_ref::<V>())
    }

    pub fn get_raw(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Collects parameters for component `C` through typed [`Property`] handles.
pub struct ParameterBuilder<C> {
    parameters: Parameters,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> ParameterBuilder<C> {
    pub fn new() -> Self {
        Self {
            parameters: Parameters::new(),
            _component: PhantomData,
        }
    }

    /// Fails when `C` does not declare the property or it was already set.
    pub fn add<V>(
        &mut self,
        property: Property<C, V>,
        value: V,
    ) -> Result<&mut Self, ParameterError>
    where
        V: Any + Send + Sync,
    {
        let component = ComponentType::of::<C>();
        let name = property.name();
        if !component.has_property(name) {
            return Err(ParameterError::UnknownProperty {
                component: component.name().to_string(),
                property: name.to_string(),
            });
        }
        if self.parameters.contains(name) {
            return Err(ParameterError::DuplicateProperty {
                component: component.name().to_string(),
                property: name.to_string(),
            });
        }
        self.parameters.insert(name, value);
        Ok(self)
    }

    pub fn build(self) -> Parameters {
        self.parameters
    }
}

impl<C: Component> Default for ParameterBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a configuration callback against a fresh builder.
pub(crate) fn configure<C, F>(configure: F) -> Result<Parameters, ParameterError>
where
    C: Component,
    F: FnOnce(&mut ParameterBuilder<C>) -> Result<(), ParameterError>,
{
    let mut builder = ParameterBuilder::<C>::new();
    configure(&mut builder)?;
    Ok(builder.build())
}
