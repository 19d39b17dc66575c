//! Error types for registration and resolution

use crate::ServiceId;
use thiserror::Error;

/// Errors that can occur while registering or resolving services
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No component is registered for the requested service
    #[error("The requested service '{type_name}' has no registered components")]
    NotRegistered {
        type_name: &'static str,
        service: ServiceId,
    },

    /// A component is already registered for this service
    #[error("Service already registered: {type_name}")]
    AlreadyRegistered { type_name: &'static str },

    /// The service was requested again while it was still being activated
    #[error("Circular dependency detected while resolving {type_name}: {path}")]
    CircularDependency {
        type_name: &'static str,
        /// Resolution chain, outermost first, ending with the repeated service
        path: String,
    },

    /// A factory failed to create the service
    #[error("Failed to create service {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },

    /// Container is locked and cannot be modified
    #[error("Container is locked - cannot register new services")]
    Locked,

    /// Internal error
    #[error("Internal DI error: {0}")]
    Internal(String),
}

impl DiError {
    /// Create a NotRegistered error for a service identity
    #[inline]
    pub fn not_registered(service: ServiceId) -> Self {
        Self::NotRegistered {
            type_name: service.type_name(),
            service,
        }
    }

    /// Create an AlreadyRegistered error for a service identity
    #[inline]
    pub fn already_registered(service: ServiceId) -> Self {
        Self::AlreadyRegistered {
            type_name: service.type_name(),
        }
    }

    /// Create a CircularDependency error from the chain of services being activated
    pub fn circular(service: ServiceId, chain: &[ServiceId]) -> Self {
        let path = chain
            .iter()
            .chain(std::iter::once(&service))
            .map(|id| id.type_name())
            .collect::<Vec<_>>()
            .join(" -> ");

        Self::CircularDependency {
            type_name: service.type_name(),
            path,
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed<S: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<S>(),
            reason: reason.into(),
        }
    }

    /// Whether this error means the requested service has no registration
    #[inline]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    trait Repository {}
    struct Database;
    struct Cache;

    #[test]
    fn test_not_registered_message() {
        let err = DiError::not_registered(ServiceId::of::<dyn Repository>());
        assert!(err.is_not_registered());
        assert!(err.to_string().contains("Repository"));
        assert!(err.to_string().contains("has no registered components"));
    }

    #[test]
    fn test_circular_path() {
        let chain = [ServiceId::of::<Database>(), ServiceId::of::<Cache>()];
        let err = DiError::circular(ServiceId::of::<Database>(), &chain);

        match err {
            DiError::CircularDependency { type_name, path } => {
                assert!(type_name.ends_with("Database"));
                assert_eq!(path.matches(" -> ").count(), 2);
                assert!(path.ends_with("Database"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clone_preserves_variant() {
        let err = DiError::creation_failed::<Database>("connection refused");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
