mod core;

pub use self::core::{AccessCache, AccessRequirement, Authorizer, Principal};
