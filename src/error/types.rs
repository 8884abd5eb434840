use thiserror::Error;

use crate::services::SharedStateError;

/// Unified result type for the regions crate.
pub type Result<T> = std::result::Result<T, RegionError>;

/// Errors surfaced by the region registry and its collaborators.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("the type {component} is already registered{} with region \"{region}\"", with_key(.key))]
    DuplicateKey {
        region: String,
        component: String,
        key: String,
    },
    #[error("the region \"{0}\" does not exist")]
    RegionNotFound(String),
    #[error("the type {component} is not registered{} with region \"{region}\"", with_key(.key))]
    RegistrationNotFound {
        region: String,
        component: String,
        key: String,
    },
    #[error("invalid component parameters: {0}")]
    Parameter(#[from] ParameterError),
    #[error("service scope error: {0}")]
    Services(#[from] SharedStateError),
}

/// Failures raised while building component parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("`{property}` is not a property of {component}")]
    UnknownProperty {
        component: String,
        property: String,
    },
    #[error("`{property}` was already set for {component}")]
    DuplicateProperty {
        component: String,
        property: String,
    },
}

fn with_key(key: &str) -> String {
    if key.is_empty() {
        String::new()
    } else {
        format!(" with key \"{key}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_not_found_mentions_key_only_when_set() {
        let default_key = RegionError::RegistrationNotFound {
            region: "Main".into(),
            component: "Banner".into(),
            key: String::new(),
        };
        assert_eq!(
            default_key.to_string(),
            "the type Banner is not registered with region \"Main\""
        );

        let keyed = RegionError::RegistrationNotFound {
            region: "Main".into(),
            component: "Banner".into(),
            key: "1".into(),
        };
        assert_eq!(
            keyed.to_string(),
            "the type Banner is not registered with key \"1\" with region \"Main\""
        );
    }

    #[test]
    fn region_not_found_names_region() {
        let err = RegionError::RegionNotFound("Sidebar".into());
        assert!(err.to_string().contains("\"Sidebar\""));
    }
}
