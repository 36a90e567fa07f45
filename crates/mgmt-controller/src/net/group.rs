//! `socket-binding-group` resources

use super::{INCLUDES, INTERFACE_CAPABILITY};
use crate::context::OperationContext;
use crate::handlers::ResourceHandler;
use mgmt_model::ModelType;
use mgmt_validation::{
    AttributeDefinition, AttributeDefinitionBuilder, ListValidator, StringLengthValidator,
};
use std::sync::Arc;

/// Default interface attribute name
pub const DEFAULT_INTERFACE: &str = "default-interface";

/// Group of socket bindings sharing a default interface
#[derive(Debug)]
pub struct SocketBindingGroupResource {
    attributes: Vec<AttributeDefinition>,
}

impl SocketBindingGroupResource {
    /// Resource definition
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: vec![
                AttributeDefinitionBuilder::new(DEFAULT_INTERFACE, ModelType::String)
                    .required(true)
                    .validator(Arc::new(StringLengthValidator::non_empty()))
                    .capability_reference(INTERFACE_CAPABILITY.name())
                    .description("Interface used by bindings that name none")
                    .build(),
                AttributeDefinitionBuilder::new(INCLUDES, ModelType::List)
                    .validator(Arc::new(
                        ListValidator::new(Arc::new(StringLengthValidator::non_empty()))
                            .nullable(true),
                    ))
                    .description("Groups whose bindings this group also contains")
                    .build(),
            ],
        }
    }

    /// Definition of the default interface attribute
    #[must_use]
    pub fn default_interface(&self) -> &AttributeDefinition {
        &self.attributes[0]
    }
}

impl Default for SocketBindingGroupResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for SocketBindingGroupResource {
    fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    fn requires_runtime(&self, _context: &OperationContext) -> bool {
        false
    }
}
