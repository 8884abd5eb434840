use crate::component::{ComponentType, Parameters};

/// One component registered into a region. Immutable once created.
#[derive(Debug, Clone)]
pub struct ComponentRegistration {
    key: String,
    component: ComponentType,
    parameters: Option<Parameters>,
}

impl ComponentRegistration {
    pub(crate) fn new(
        key: impl Into<String>,
        component: ComponentType,
        parameters: Option<Parameters>,
    ) -> Self {
        Self {
            key: key.into(),
            component,
            parameters,
        }
    }

    /// Disambiguation key; empty for the default registration.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn component(&self) -> ComponentType {
        self.component
    }

    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    pub fn is_default_key(&self) -> bool {
        self.key.is_empty()
    }
}
