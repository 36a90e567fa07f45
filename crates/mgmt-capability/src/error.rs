//! Capability errors

use mgmt_model::Address;

/// Errors raised by capability registration and resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// No registration visible from the requesting address
    #[error("required capability '{name}' is not available from {from}")]
    NotFound {
        /// Dynamic capability name
        name: String,
        /// Address the requirement was resolved from
        from: Address,
    },

    /// Registration provides a different value type
    #[error("capability '{name}' provides {actual}, expected {expected}")]
    TypeMismatch {
        /// Dynamic capability name
        name: String,
        /// Type the requirer asked for
        expected: String,
        /// Type the registration provides
        actual: String,
    },

    /// Same capability already registered in a conflicting scope
    #[error("capability '{name}' is already registered by {registrant}")]
    AlreadyRegistered {
        /// Dynamic capability name
        name: String,
        /// Resource holding the earlier registration
        registrant: Address,
    },
}

impl CapabilityError {
    /// Stable message key reported to callers
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "capabilityNotFound",
            Self::TypeMismatch { .. } => "capabilityTypeMismatch",
            Self::AlreadyRegistered { .. } => "capabilityAlreadyRegistered",
        }
    }
}
