//! Controller errors

use crate::state::TransactionState;
use mgmt_capability::CapabilityError;
use mgmt_model::{Address, OperationRequest};
use mgmt_service::ServiceError;
use mgmt_tree::TreeError;
use mgmt_validation::ValidationError;

/// Errors raised while executing a step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// Parameter or attribute validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Resource tree read or write failed
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Capability registration or resolution failed
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Service installation or removal failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// No handler registered for the operation at the address
    #[error("no operation '{operation}' at {address}")]
    UnknownOperation {
        /// Requested operation name
        operation: String,
        /// Target address
        address: Address,
    },

    /// Attribute not defined for the addressed resource
    #[error("no attribute '{name}' at {address}")]
    UnknownAttribute {
        /// Requested attribute name
        name: String,
        /// Target address
        address: Address,
    },

    /// Pipeline moved to a state it may not reach
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: TransactionState,
        /// Rejected target state
        to: TransactionState,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Handler-specific failure
    #[error("{0}")]
    Failed(String),
}

impl ControllerError {
    /// Stable message key reported to callers
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.message_key(),
            Self::Tree(e) => e.message_key(),
            Self::Capability(e) => e.message_key(),
            Self::Service(e) => e.message_key(),
            Self::UnknownOperation { .. } => "unknownOperation",
            Self::UnknownAttribute { .. } => "unknownAttribute",
            Self::IllegalTransition { .. } => "illegalTransition",
            Self::Config(_) => "config",
            Self::Failed(_) => "operationFailed",
        }
    }

    /// Offending parameter, for validation failures
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::Validation(e) => e.parameter(),
            Self::UnknownAttribute { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Structured failure returned for a rolled back request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{operation}' at {address} failed: {cause}")]
pub struct OperationFailed {
    /// Stable key of the cause
    pub message_key: &'static str,
    /// Operation name of the request
    pub operation: String,
    /// Address of the step that failed
    pub address: Address,
    /// Offending parameter, if any
    pub parameter: Option<String>,
    /// Underlying error
    #[source]
    pub cause: ControllerError,
    /// Compensations that failed during rollback
    pub rollback_warnings: Vec<String>,
}

impl OperationFailed {
    /// Failure of `request`, raised by the step at `address`
    #[must_use]
    pub fn new(
        request: &OperationRequest,
        address: Address,
        cause: ControllerError,
        rollback_warnings: Vec<String>,
    ) -> Self {
        Self {
            message_key: cause.message_key(),
            operation: request.operation().to_string(),
            address,
            parameter: cause.parameter().map(str::to_string),
            cause,
            rollback_warnings,
        }
    }

    /// JSON form reported by the CLI
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "outcome": "failed",
            "failure-description": self.cause.to_string(),
            "message-key": self.message_key,
            "address": self.address.to_string(),
            "parameter": self.parameter,
            "rollback-warnings": self.rollback_warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_key_and_parameter() {
        let request = OperationRequest::new(Address::root(), "add");
        let cause = ControllerError::from(ValidationError::NullNotAllowed {
            parameter: "host".into(),
        });
        let failed = OperationFailed::new(&request, Address::root(), cause, Vec::new());
        assert_eq!(failed.message_key, "nullNotAllowed");
        assert_eq!(failed.parameter.as_deref(), Some("host"));
        assert_eq!(failed.to_json()["outcome"], "failed");
    }
}
