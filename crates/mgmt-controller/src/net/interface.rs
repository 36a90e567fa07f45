//! `interface` resources

use super::services::NetworkInterfaceBinding;
use super::{legacy_name, resolve_string, INTERFACE_CAPABILITY};
use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::handlers::ResourceHandler;
use mgmt_capability::RuntimeCapability;
use mgmt_model::{ModelType, ModelValue, OperationRequest};
use mgmt_service::ServiceNode;
use mgmt_validation::{AttributeDefinition, AttributeDefinitionBuilder, StringLengthValidator};
use std::sync::Arc;

/// Named network interface
#[derive(Debug)]
pub struct InterfaceResource {
    attributes: Vec<AttributeDefinition>,
}

impl InterfaceResource {
    /// Resource definition
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: vec![AttributeDefinitionBuilder::new("inet-address", ModelType::String)
                .required(true)
                .allow_expression(true)
                .validator(Arc::new(StringLengthValidator::non_empty()))
                .description("Address the interface resolves to")
                .build()],
        }
    }
}

impl Default for InterfaceResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for InterfaceResource {
    fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    fn capability(&self) -> Option<&RuntimeCapability> {
        Some(&INTERFACE_CAPABILITY)
    }

    fn requires_runtime(&self, context: &OperationContext) -> bool {
        super::requires_runtime(context)
    }

    fn perform_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let name = interface_name(operation);
        let service = NetworkInterfaceBinding {
            name: name.to_string(),
            inet_address: resolve_string(context, &self.attributes[0], model)?,
        };
        let node = ServiceNode::builder(INTERFACE_CAPABILITY.service_name(Some(name)), Arc::new(service))
            .add_alias(legacy_name("jboss.network", name))
            .build();
        context.install_service(node)
    }

    fn perform_remove_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        _model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let name = interface_name(operation);
        context.remove_service(&INTERFACE_CAPABILITY.service_name(Some(name)))?;
        Ok(())
    }
}

fn interface_name(operation: &OperationRequest) -> &str {
    operation
        .address()
        .last_element()
        .map(|e| e.value())
        .unwrap_or_default()
}
