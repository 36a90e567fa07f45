//! Operation requests

use crate::address::Address;
use crate::value::ModelValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known operation names
pub mod names {
    /// Create a resource
    pub const ADD: &str = "add";
    /// Remove a resource
    pub const REMOVE: &str = "remove";
    /// Read a resource's model
    pub const READ_RESOURCE: &str = "read-resource";
    /// Change one attribute
    pub const WRITE_ATTRIBUTE: &str = "write-attribute";
}

/// A single configuration change request
///
/// Immutable once built: the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    address: Address,
    operation: String,
    #[serde(default)]
    params: BTreeMap<String, ModelValue>,
}

impl OperationRequest {
    /// Create a request without parameters
    #[must_use]
    pub fn new(address: Address, operation: impl Into<String>) -> Self {
        Self {
            address,
            operation: operation.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ModelValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Target address
    #[inline]
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Parameter value, [`ModelValue::Undefined`] when absent
    #[must_use]
    pub fn param(&self, name: &str) -> &ModelValue {
        static UNDEFINED: ModelValue = ModelValue::Undefined;
        self.params.get(name).unwrap_or(&UNDEFINED)
    }

    /// Check if a parameter is present and defined
    #[must_use]
    pub fn has_defined(&self, name: &str) -> bool {
        self.param(name).is_defined()
    }

    /// All parameters
    #[inline]
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, ModelValue> {
        &self.params
    }
}

impl fmt::Display for OperationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_is_undefined() {
        let op = OperationRequest::new(Address::root(), names::ADD);
        assert!(!op.param("port").is_defined());
    }

    #[test]
    fn deserializes_from_json() {
        let op: OperationRequest = serde_json::from_str(
            r#"{"address": "/interface=public", "operation": "add",
                "params": {"inet-address": "${jboss.bind.address:127.0.0.1}"}}"#,
        )
        .unwrap();
        assert_eq!(op.address().to_string(), "/interface=public");
        assert!(op.param("inet-address").is_expression());
        assert_eq!(op.to_string(), "/interface=public:add");
    }
}
