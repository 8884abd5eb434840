mod core;
mod parameters;

pub use self::core::{Component, ComponentType, Property};
pub use self::parameters::{ParameterBuilder, ParameterValue, Parameters};

pub(crate) use self::parameters::configure;
