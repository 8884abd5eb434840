pub mod audit;
mod config;
mod core;
mod events;
mod index;
mod registration;

pub use self::audit::{
    MemoryAudit, NullRegistryAudit, RegistryAudit, RegistryAuditEvent, RegistryAuditEventBuilder,
    RegistryAuditStage,
};
pub use self::config::RegistryConfig;
pub use self::core::RegionRegistry;
pub use self::events::{RegionEvents, RegionsChanged, RegionsChangedHandler, SubscriptionId};
pub use self::registration::ComponentRegistration;
