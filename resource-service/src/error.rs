//! Configuration-time error types
//!
//! Failures that can happen while a service is being assembled: loading
//! config, binding routes, starting the RPC registry, connecting a cache.
//! Per-request failures are [`ApiError`](crate::resource::ApiError) instead.

use thiserror::Error;

use crate::cache::CacheError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for building and starting a resource service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The action name is unknown or the model cannot serve it
    #[error("Unsupported action: {action}")]
    UnsupportedAction {
        /// The action as requested
        action: String,
    },

    /// The same action was requested twice for one router
    #[error("Duplicate route for action {action}")]
    DuplicateRoute {
        /// The repeated action
        action: String,
    },

    /// RPC registry failure at start-up
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Cache adapter failure
    #[error("{0}")]
    Cache(#[from] CacheError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an [`Error::UnsupportedAction`]
    pub fn unsupported_action(action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            action: action.into(),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_action_display() {
        let err = Error::unsupported_action("Edit");
        assert_eq!(err.to_string(), "Unsupported action: Edit");
    }

    #[test]
    fn test_duplicate_route_display() {
        let err = Error::DuplicateRoute {
            action: "List".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate route for action List");
    }

    #[test]
    fn test_from_figment_error() {
        let err: Error = figment::Error::from("missing field".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
