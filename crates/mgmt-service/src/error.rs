//! Service errors

use crate::name::ServiceName;

/// Errors raised when building or registering services
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Name or alias already in use
    #[error("service {name} is already registered")]
    Duplicate {
        /// Contested name
        name: ServiceName,
    },

    /// No service with that name or alias
    #[error("service {name} is not registered")]
    Unknown {
        /// Name that was looked up
        name: ServiceName,
    },

    /// Adding the service would close a dependency cycle
    #[error("service {name} would create a dependency cycle")]
    DependencyCycle {
        /// Service whose dependencies close the cycle
        name: ServiceName,
    },
}

impl ServiceError {
    /// Stable message key reported to callers
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "duplicateService",
            Self::Unknown { .. } => "unknownService",
            Self::DependencyCycle { .. } => "dependencyCycle",
        }
    }
}
