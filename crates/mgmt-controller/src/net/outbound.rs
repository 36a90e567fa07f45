//! Outbound socket bindings
//!
//! Two resource kinds share one handler: remote-destination bindings name a
//! host and port, local-destination bindings reference a socket binding of
//! the same process. Both register `org.wildfly.network.outbound-socket-binding`
//! and install an on-demand [`OutboundSocketBinding`] service that is also
//! reachable under `jboss.outbound-socket-binding.<name>`.

use super::services::{Destination, OutboundSocketBinding};
use super::{
    check_binding_name, legacy_name, resolve_int, resolve_optional, resolve_string,
    INTERFACE_CAPABILITY, LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING,
    OUTBOUND_SOCKET_BINDING_CAPABILITY, REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING,
    SOCKET_BINDING_CAPABILITY, SOCKET_BINDING_MANAGER_CAPABILITY,
};
use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::handlers::ResourceHandler;
use crate::state::Stage;
use mgmt_capability::RuntimeCapability;
use mgmt_model::{ModelType, ModelValue, OperationRequest};
use mgmt_service::{InjectionTarget, ServiceMode, ServiceName, ServiceNode};
use mgmt_validation::{
    AttributeDefinition, AttributeDefinitionBuilder, IntRangeValidator, StringLengthValidator,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Prefix of the legacy outbound binding service name
pub const LEGACY_SERVICE_PREFIX: &str = "jboss.outbound-socket-binding";

/// Which destination an outbound binding has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundKind {
    /// `host` and `port`
    Remote,
    /// `socket-binding-ref`
    Local,
}

impl OutboundKind {
    /// Collection holding bindings of this kind
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Remote => REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING,
            Self::Local => LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING,
        }
    }
}

/// Outbound socket binding resource definition
#[derive(Debug)]
pub struct OutboundSocketBindingResource {
    kind: OutboundKind,
    /// Destination attributes first, then the source attributes
    attributes: Vec<AttributeDefinition>,
}

fn source_attributes() -> [AttributeDefinition; 3] {
    [
        AttributeDefinitionBuilder::new("source-interface", ModelType::String)
            .validator(Arc::new(StringLengthValidator::non_empty()))
            .capability_reference(INTERFACE_CAPABILITY.name())
            .description("Interface the local side of the socket binds to")
            .build(),
        AttributeDefinitionBuilder::new("source-port", ModelType::Int)
            .allow_expression(true)
            .validator(Arc::new(IntRangeValidator::port()))
            .description("Port the local side of the socket binds to")
            .build(),
        AttributeDefinitionBuilder::new("fixed-source-port", ModelType::Boolean)
            .allow_expression(true)
            .default_value(false)
            .description("Ignore the port offset for the source port")
            .build(),
    ]
}

impl OutboundSocketBindingResource {
    /// `remote-destination-outbound-socket-binding`
    #[must_use]
    pub fn remote() -> Self {
        let mut attributes = vec![
            AttributeDefinitionBuilder::new("host", ModelType::String)
                .required(true)
                .allow_expression(true)
                .validator(Arc::new(StringLengthValidator::non_empty()))
                .description("Destination host")
                .build(),
            AttributeDefinitionBuilder::new("port", ModelType::Int)
                .required(true)
                .allow_expression(true)
                .validator(Arc::new(IntRangeValidator::port()))
                .description("Destination port")
                .build(),
        ];
        attributes.extend(source_attributes());
        Self {
            kind: OutboundKind::Remote,
            attributes,
        }
    }

    /// `local-destination-outbound-socket-binding`
    #[must_use]
    pub fn local() -> Self {
        let mut attributes = vec![AttributeDefinitionBuilder::new(
            "socket-binding-ref",
            ModelType::String,
        )
        .required(true)
        .validator(Arc::new(StringLengthValidator::non_empty()))
        .capability_reference(SOCKET_BINDING_CAPABILITY.name())
        .description("Local socket binding to connect to")
        .build()];
        attributes.extend(source_attributes());
        Self {
            kind: OutboundKind::Local,
            attributes,
        }
    }

    /// Destination kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OutboundKind {
        self.kind
    }

    fn attribute(&self, name: &str) -> Result<&AttributeDefinition, ControllerError> {
        self.attributes
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| ControllerError::Failed(format!("no attribute definition '{name}'")))
    }

    fn destination(
        &self,
        context: &OperationContext,
        model: &ModelValue,
    ) -> Result<(Destination, Option<(ServiceName, &'static str)>), ControllerError> {
        match self.kind {
            OutboundKind::Remote => Ok((
                Destination::Remote {
                    host: resolve_string(context, self.attribute("host")?, model)?,
                    port: resolve_int(context, self.attribute("port")?, model)?,
                },
                None,
            )),
            OutboundKind::Local => {
                let socket_binding =
                    resolve_string(context, self.attribute("socket-binding-ref")?, model)?;
                let service = context.resolve_capability_service_name(
                    SOCKET_BINDING_CAPABILITY.name(),
                    Some(&socket_binding),
                    SOCKET_BINDING_CAPABILITY.value_type(),
                )?;
                Ok((
                    Destination::Local { socket_binding },
                    Some((service, SOCKET_BINDING_CAPABILITY.value_type())),
                ))
            }
        }
    }
}

impl ResourceHandler for OutboundSocketBindingResource {
    fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    fn capability(&self) -> Option<&RuntimeCapability> {
        Some(&OUTBOUND_SOCKET_BINDING_CAPABILITY)
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
        let kind = self.kind.collection();
        let check = move |ctx: &mut OperationContext, _: &OperationRequest| {
            check_binding_name(ctx, kind)
        };
        context.add_step_fn(Stage::Model, operation.clone(), check)?;
        // the rebased tree may hold a sibling committed since the model stage
        context.add_step_fn(Stage::Verify, operation.clone(), check)
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
        let name = binding_name(operation);
        let (destination, destination_dependency) = self.destination(context, model)?;

        let source_interface =
            resolve_optional(context, self.attribute("source-interface")?, model)?
                .map(|v| v.to_string());
        let source_port = resolve_optional(context, self.attribute("source-port")?, model)?
            .and_then(|v| v.as_int());
        let fixed_source_port = context
            .resolve_attribute(self.attribute("fixed-source-port")?, model)?
            .as_bool()
            .unwrap_or(false);

        let mut builder = ServiceNode::builder(
            OUTBOUND_SOCKET_BINDING_CAPABILITY.service_name(Some(name)),
            Arc::new(OutboundSocketBinding {
                name: name.to_string(),
                destination,
                source_interface: source_interface.clone(),
                source_port,
                fixed_source_port,
            }),
        );

        if let Some(interface) = &source_interface {
            let service = context.resolve_capability_service_name(
                INTERFACE_CAPABILITY.name(),
                Some(interface),
                INTERFACE_CAPABILITY.value_type(),
            )?;
            builder = builder.add_dependency(
                service,
                INTERFACE_CAPABILITY.value_type(),
                InjectionTarget::new("source-interface"),
            );
        }
        if let Some((service, value_type)) = destination_dependency {
            builder = builder.add_dependency(
                service,
                value_type,
                InjectionTarget::new("local-destination-socket-binding"),
            );
        }
        let manager = context.resolve_capability_service_name(
            SOCKET_BINDING_MANAGER_CAPABILITY.name(),
            None,
            SOCKET_BINDING_MANAGER_CAPABILITY.value_type(),
        )?;

        let node = builder
            .add_dependency(
                manager,
                SOCKET_BINDING_MANAGER_CAPABILITY.value_type(),
                InjectionTarget::new("socket-binding-manager"),
            )
            .initial_mode(ServiceMode::OnDemand)
            .add_alias(legacy_name(LEGACY_SERVICE_PREFIX, name))
            .build();
        debug!(binding = %name, kind = ?self.kind, "installing outbound socket binding");
        context.install_service(node)
    }

    fn perform_remove_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        _model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let name = binding_name(operation);
        context.remove_service(&OUTBOUND_SOCKET_BINDING_CAPABILITY.service_name(Some(name)))?;
        Ok(())
    }
}

fn binding_name(operation: &OperationRequest) -> &str {
    operation
        .address()
        .last_element()
        .map(|e| e.value())
        .unwrap_or_default()
}
