//! `socket-binding` resources

use super::group::SocketBindingGroupResource;
use super::services::SocketBinding;
use super::{
    check_binding_name, legacy_name, resolve_int, resolve_optional, INTERFACE_CAPABILITY,
    SOCKET_BINDING, SOCKET_BINDING_CAPABILITY, SOCKET_BINDING_MANAGER_CAPABILITY,
};
use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::handlers::ResourceHandler;
use crate::state::Stage;
use mgmt_capability::RuntimeCapability;
use mgmt_model::{ModelType, ModelValue, OperationRequest};
use mgmt_service::{InjectionTarget, ServiceMode, ServiceNode};
use mgmt_validation::{
    AttributeDefinition, AttributeDefinitionBuilder, IntRangeValidator, StringLengthValidator,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const INTERFACE: usize = 0;
const PORT: usize = 1;
const FIXED_PORT: usize = 2;
const MULTICAST_ADDRESS: usize = 3;
const MULTICAST_PORT: usize = 4;

/// Inbound socket binding
#[derive(Debug)]
pub struct SocketBindingResource {
    attributes: Vec<AttributeDefinition>,
    default_interface: AttributeDefinition,
}

impl SocketBindingResource {
    /// Resource definition
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: vec![
                AttributeDefinitionBuilder::new("interface", ModelType::String)
                    .validator(Arc::new(StringLengthValidator::non_empty()))
                    .capability_reference(INTERFACE_CAPABILITY.name())
                    .description("Interface to bind to; defaults to the group's")
                    .build(),
                AttributeDefinitionBuilder::new("port", ModelType::Int)
                    .allow_expression(true)
                    .default_value(0)
                    .validator(Arc::new(IntRangeValidator::port()))
                    .description("Port, 0 for an ephemeral one")
                    .build(),
                AttributeDefinitionBuilder::new("fixed-port", ModelType::Boolean)
                    .allow_expression(true)
                    .default_value(false)
                    .description("Ignore the port offset")
                    .build(),
                AttributeDefinitionBuilder::new("multicast-address", ModelType::String)
                    .allow_expression(true)
                    .validator(Arc::new(StringLengthValidator::non_empty()))
                    .description("Multicast group")
                    .build(),
                AttributeDefinitionBuilder::new("multicast-port", ModelType::Int)
                    .allow_expression(true)
                    .validator(Arc::new(IntRangeValidator::new(1, 65535)))
                    .description("Multicast port")
                    .build(),
            ],
            default_interface: SocketBindingGroupResource::new()
                .default_interface()
                .clone(),
        }
    }
}

impl Default for SocketBindingResource {
    fn default() -> Self {
        Self::new()
    }
}

fn check_name(context: &mut OperationContext, _: &OperationRequest) -> Result<(), ControllerError> {
    check_binding_name(context, SOCKET_BINDING)
}

impl ResourceHandler for SocketBindingResource {
    fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    fn capability(&self) -> Option<&RuntimeCapability> {
        Some(&SOCKET_BINDING_CAPABILITY)
    }

    fn populate_model(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        model: &mut BTreeMap<String, ModelValue>,
    ) -> Result<(), ControllerError> {
        for attribute in &self.attributes {
            attribute.validate_and_set(operation, model)?;
        }
        context.add_step(Stage::Model, operation.clone(), Arc::new(check_name))?;
        context.add_step(Stage::Verify, operation.clone(), Arc::new(check_name))
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
        let address = operation.address();
        let name = address.last_element().map(|e| e.value()).unwrap_or_default();

        let interface = match resolve_optional(context, &self.attributes[INTERFACE], model)? {
            Some(interface) => interface.to_string(),
            None => {
                let group = address.parent().unwrap_or_default();
                let group_model = context.read_resource_from_root(&group, false)?.model_value();
                context
                    .resolve_attribute(&self.default_interface, &group_model)?
                    .to_string()
            }
        };

        let service = SocketBinding {
            name: name.to_string(),
            interface: interface.clone(),
            port: resolve_int(context, &self.attributes[PORT], model)?,
            fixed_port: context
                .resolve_attribute(&self.attributes[FIXED_PORT], model)?
                .as_bool()
                .unwrap_or(false),
            multicast_address: resolve_optional(context, &self.attributes[MULTICAST_ADDRESS], model)?
                .map(|v| v.to_string()),
            multicast_port: resolve_optional(context, &self.attributes[MULTICAST_PORT], model)?
                .and_then(|v| v.as_int()),
        };

        let interface_service = context.resolve_capability_service_name(
            INTERFACE_CAPABILITY.name(),
            Some(&interface),
            INTERFACE_CAPABILITY.value_type(),
        )?;
        let manager = context.resolve_capability_service_name(
            SOCKET_BINDING_MANAGER_CAPABILITY.name(),
            None,
            SOCKET_BINDING_MANAGER_CAPABILITY.value_type(),
        )?;

        let node = ServiceNode::builder(SOCKET_BINDING_CAPABILITY.service_name(Some(name)), Arc::new(service))
            .add_dependency(
                interface_service,
                INTERFACE_CAPABILITY.value_type(),
                InjectionTarget::new("interface"),
            )
            .add_dependency(
                manager,
                SOCKET_BINDING_MANAGER_CAPABILITY.value_type(),
                InjectionTarget::new("socket-binding-manager"),
            )
            .initial_mode(ServiceMode::OnDemand)
            .add_alias(legacy_name("jboss.binding", name))
            .build();
        context.install_service(node)
    }

    fn perform_remove_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        _model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let name = operation
            .address()
            .last_element()
            .map(|e| e.value())
            .unwrap_or_default();
        context.remove_service(&SOCKET_BINDING_CAPABILITY.service_name(Some(name)))?;
        Ok(())
    }
}
