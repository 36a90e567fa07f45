//! Operation registry
//!
//! Maps address patterns to resource definitions and operation handlers. A
//! pattern element with value `*` matches any name; when several patterns
//! match, the one with the most literal elements wins.

use crate::handlers::{AddStepHandler, RemoveStepHandler, ResourceHandler};
use crate::step::OperationStepHandler;
use mgmt_model::{names, Address};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Wildcard pattern value
pub const WILDCARD: &str = "*";

struct Registration {
    pattern: Address,
    resource: Option<Arc<dyn ResourceHandler>>,
    operations: BTreeMap<String, Arc<dyn OperationStepHandler>>,
}

impl Registration {
    /// Literal element count, or `None` if `address` does not match
    fn specificity(&self, address: &Address) -> Option<usize> {
        if self.pattern.len() != address.len() {
            return None;
        }
        self.pattern
            .iter()
            .zip(address.iter())
            .try_fold(0, |literal, (p, a)| {
                if p.key() != a.key() {
                    None
                } else if p.value() == WILDCARD {
                    Some(literal)
                } else if p.value() == a.value() {
                    Some(literal + 1)
                } else {
                    None
                }
            })
    }
}

/// Handlers by address pattern
#[derive(Default)]
pub struct OperationRegistry {
    registrations: Vec<Registration>,
    global: BTreeMap<String, Arc<dyn OperationStepHandler>>,
}

impl OperationRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, pattern: &Address) -> &mut Registration {
        let index = match self.registrations.iter().position(|r| &r.pattern == pattern) {
            Some(index) => index,
            None => {
                self.registrations.push(Registration {
                    pattern: pattern.clone(),
                    resource: None,
                    operations: BTreeMap::new(),
                });
                self.registrations.len() - 1
            }
        };
        &mut self.registrations[index]
    }

    /// Register a resource type with its `add` and `remove` handlers
    pub fn register_resource(&mut self, pattern: &Address, handler: Arc<dyn ResourceHandler>) {
        let add: Arc<dyn OperationStepHandler> = Arc::new(AddStepHandler::new(handler.clone()));
        let remove: Arc<dyn OperationStepHandler> =
            Arc::new(RemoveStepHandler::new(handler.clone()));
        let entry = self.entry(pattern);
        entry.resource = Some(handler);
        entry.operations.insert(names::ADD.to_string(), add);
        entry.operations.insert(names::REMOVE.to_string(), remove);
        debug!(pattern = %pattern, "resource registered");
    }

    /// Register an operation at one pattern
    pub fn register_operation(
        &mut self,
        pattern: &Address,
        name: impl Into<String>,
        handler: Arc<dyn OperationStepHandler>,
    ) {
        self.entry(pattern).operations.insert(name.into(), handler);
    }

    /// Register an operation available at every address
    pub fn register_global(&mut self, name: impl Into<String>, handler: Arc<dyn OperationStepHandler>) {
        self.global.insert(name.into(), handler);
    }

    fn best_match<T>(
        &self,
        address: &Address,
        pick: impl Fn(&Registration) -> Option<T>,
    ) -> Option<T> {
        self.registrations
            .iter()
            .filter_map(|r| Some((r.specificity(address)?, pick(r)?)))
            .max_by_key(|(literal, _)| *literal)
            .map(|(_, found)| found)
    }

    /// Handler for `operation` at `address`
    ///
    /// Resource-specific handlers take precedence over global ones.
    #[must_use]
    pub fn find(&self, address: &Address, operation: &str) -> Option<Arc<dyn OperationStepHandler>> {
        self.best_match(address, |r| r.operations.get(operation).cloned())
            .or_else(|| self.global.get(operation).cloned())
    }

    /// Resource definition registered for `address`
    #[must_use]
    pub fn resource(&self, address: &Address) -> Option<Arc<dyn ResourceHandler>> {
        self.best_match(address, |r| r.resource.clone())
    }

    /// JSON description of every pattern, its operations and attributes
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for registration in &self.registrations {
            let attributes: serde_json::Map<_, _> = registration
                .resource
                .iter()
                .flat_map(|r| r.attributes())
                .map(|a| (a.name().to_string(), a.describe()))
                .collect();
            let mut entry = serde_json::json!({
                "operations": registration.operations.keys().collect::<Vec<_>>(),
                "attributes": attributes,
            });
            if let Some(capability) = registration.resource.as_ref().and_then(|r| r.capability()) {
                entry["capability"] = capability.name().into();
            }
            out.insert(registration.pattern.to_string(), entry);
        }
        serde_json::json!({
            "resources": out,
            "global-operations": self.global.keys().collect::<Vec<_>>(),
        })
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field(
                "patterns",
                &self
                    .registrations
                    .iter()
                    .map(|r| r.pattern.to_string())
                    .collect::<Vec<_>>(),
            )
            .field("global", &self.global.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OperationContext;
    use crate::error::ControllerError;
    use mgmt_model::OperationRequest;

    fn noop() -> Arc<dyn OperationStepHandler> {
        Arc::new(
            |_: &mut OperationContext, _: &OperationRequest| -> Result<(), ControllerError> {
                Ok(())
            },
        )
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn literal_pattern_beats_wildcard() {
        let mut registry = OperationRegistry::new();
        let wildcard = noop();
        let literal = noop();
        registry.register_operation(&addr("/socket-binding-group=*"), "op", wildcard.clone());
        registry.register_operation(&addr("/socket-binding-group=standard"), "op", literal.clone());

        let found = registry.find(&addr("/socket-binding-group=standard"), "op").unwrap();
        assert!(Arc::ptr_eq(&found, &literal));
        let found = registry.find(&addr("/socket-binding-group=other"), "op").unwrap();
        assert!(Arc::ptr_eq(&found, &wildcard));
    }

    #[test]
    fn keys_and_depth_must_match() {
        let mut registry = OperationRegistry::new();
        registry.register_operation(&addr("/socket-binding-group=*"), "op", noop());
        assert!(registry.find(&addr("/interface=public"), "op").is_none());
        assert!(registry
            .find(&addr("/socket-binding-group=a/socket-binding=b"), "op")
            .is_none());
    }

    #[test]
    fn global_operations_apply_everywhere() {
        let mut registry = OperationRegistry::new();
        registry.register_global("read-resource", noop());
        assert!(registry.find(&Address::root(), "read-resource").is_some());
        assert!(registry.find(&addr("/anything=x"), "read-resource").is_some());
        assert!(registry.find(&Address::root(), "add").is_none());
    }
}
