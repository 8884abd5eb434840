//! Region registry for composing independently built UI components.
//!
//! Components are registered against named regions and rendered later by a
//! [`RegionView`] that only knows the region name. The [`RegionRegistry`]
//! owns the `(region, component type, key)` index and the change
//! notifications views subscribe to.
//!
//! ```
//! use std::sync::Arc;
//! use room_regions::{AccessCache, Component, RegionRegistry, RegionView};
//!
//! struct Banner;
//! impl Component for Banner {}
//!
//! let registry = Arc::new(RegionRegistry::new());
//! let access = Arc::new(AccessCache::new());
//! let mut view = RegionView::mount("Main", Arc::clone(&registry), access);
//!
//! registry.register::<Banner>("Main").unwrap();
//! registry.raise_regions_changed(["Main"]);
//!
//! let outcome = view.render(&|r: &room_regions::ComponentRegistration| r.component().to_string());
//! assert_eq!(outcome.content, "Banner");
//! ```

pub mod access;
pub mod component;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod region;
pub mod registry;
pub mod services;

pub use access::{AccessCache, AccessRequirement, Authorizer, Principal};
pub use component::{
    Component, ComponentType, ParameterBuilder, ParameterValue, Parameters, Property,
};
pub use error::{ParameterError, RegionError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, RegistryMetrics};
pub use region::{ComponentRenderer, ItemTemplate, RegionView, RenderOutcome};
pub use registry::{
    ComponentRegistration, MemoryAudit, NullRegistryAudit, RegionEvents, RegionRegistry,
    RegionsChanged, RegionsChangedHandler, RegistryAudit, RegistryAuditEvent,
    RegistryAuditEventBuilder, RegistryAuditStage, RegistryConfig, SubscriptionId,
};
pub use services::{ServiceScope, SharedState, SharedStateError, access_cache, region_registry};
