mod types;

pub use types::{ParameterError, RegionError, Result};
