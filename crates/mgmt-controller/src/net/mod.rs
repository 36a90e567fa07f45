//! Network resources
//!
//! Interfaces, socket binding groups and the three kinds of socket binding
//! they contain. Inbound bindings and both outbound kinds share one name
//! space per group, and a group's name space extends over the groups it
//! includes.
//!
//! # Overview
//!
//! - `interface`: named network interface, capability `org.wildfly.network.interface`
//! - `socket-binding-group`: default interface and included groups
//! - `socket-binding`: inbound port, capability `org.wildfly.network.socket-binding`
//! - `remote-destination-outbound-socket-binding` and
//!   `local-destination-outbound-socket-binding`: capability
//!   `org.wildfly.network.outbound-socket-binding`

pub mod binding;
pub mod group;
pub mod interface;
pub mod outbound;
pub mod services;

use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::registry::{OperationRegistry, WILDCARD};
use mgmt_capability::RuntimeCapability;
use mgmt_model::{Address, ModelValue};
use mgmt_service::ServiceName;
use mgmt_tree::{walk_inclusions, SharedNamespace, TreeError};
use mgmt_validation::AttributeDefinition;
use std::sync::Arc;
use tracing::debug;

/// `host` address key
pub const HOST: &str = "host";
/// `interface` collection
pub const INTERFACE: &str = "interface";
/// `socket-binding-group` collection
pub const SOCKET_BINDING_GROUP: &str = "socket-binding-group";
/// `socket-binding` collection
pub const SOCKET_BINDING: &str = "socket-binding";
/// `local-destination-outbound-socket-binding` collection
pub const LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING: &str =
    "local-destination-outbound-socket-binding";
/// `remote-destination-outbound-socket-binding` collection
pub const REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING: &str =
    "remote-destination-outbound-socket-binding";
/// Group attribute listing included groups
pub const INCLUDES: &str = "includes";

/// Collections of a group sharing one name space
pub const SOCKET_BINDING_NAMESPACE: SharedNamespace = SharedNamespace::new(&[
    SOCKET_BINDING,
    LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING,
    REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING,
]);

/// Named network interface
pub const INTERFACE_CAPABILITY: RuntimeCapability =
    RuntimeCapability::dynamic("org.wildfly.network.interface", "NetworkInterfaceBinding");
/// Inbound socket binding
pub const SOCKET_BINDING_CAPABILITY: RuntimeCapability =
    RuntimeCapability::dynamic("org.wildfly.network.socket-binding", "SocketBinding");
/// Outbound socket binding of either kind
pub const OUTBOUND_SOCKET_BINDING_CAPABILITY: RuntimeCapability = RuntimeCapability::dynamic(
    "org.wildfly.network.outbound-socket-binding",
    "OutboundSocketBinding",
);
/// Process-wide socket binding manager
pub const SOCKET_BINDING_MANAGER_CAPABILITY: RuntimeCapability = RuntimeCapability::new(
    "org.wildfly.management.socket-binding-manager",
    "SocketBindingManager",
);

/// Register every network resource at the root and under `/host=*`
pub fn register(registry: &mut OperationRegistry) {
    for base in [Address::root(), Address::root().append(HOST, WILDCARD)] {
        registry.register_resource(
            &base.append(INTERFACE, WILDCARD),
            Arc::new(interface::InterfaceResource::new()),
        );
        let group = base.append(SOCKET_BINDING_GROUP, WILDCARD);
        registry.register_resource(&group, Arc::new(group::SocketBindingGroupResource::new()));
        registry.register_resource(
            &group.append(SOCKET_BINDING, WILDCARD),
            Arc::new(binding::SocketBindingResource::new()),
        );
        registry.register_resource(
            &group.append(REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING, WILDCARD),
            Arc::new(outbound::OutboundSocketBindingResource::remote()),
        );
        registry.register_resource(
            &group.append(LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING, WILDCARD),
            Arc::new(outbound::OutboundSocketBindingResource::local()),
        );
    }
}

/// Runtime predicate of network resources
///
/// Servers use the default predicate; elsewhere only host-level resources
/// get services.
pub(crate) fn requires_runtime(context: &OperationContext) -> bool {
    if context.process_type().is_server() {
        context.is_default_requires_runtime()
    } else {
        context
            .current_address()
            .element(0)
            .is_some_and(|e| e.key() == HOST)
    }
}

/// Legacy name under which a service is also reachable
pub(crate) fn legacy_name(prefix: &str, name: &str) -> ServiceName {
    ServiceName::parse(prefix).append(name)
}

/// Resolved value of an optional attribute
pub(crate) fn resolve_optional(
    context: &OperationContext,
    attribute: &AttributeDefinition,
    model: &ModelValue,
) -> Result<Option<ModelValue>, ControllerError> {
    let value = context.resolve_attribute(attribute, model)?;
    Ok(value.is_defined().then_some(value))
}

/// Resolved string value of an attribute that must be set
pub(crate) fn resolve_string(
    context: &OperationContext,
    attribute: &AttributeDefinition,
    model: &ModelValue,
) -> Result<String, ControllerError> {
    Ok(context.resolve_attribute(attribute, model)?.to_string())
}

/// Resolved integer value of an attribute that must be set
pub(crate) fn resolve_int(
    context: &OperationContext,
    attribute: &AttributeDefinition,
    model: &ModelValue,
) -> Result<i64, ControllerError> {
    let value = context.resolve_attribute(attribute, model)?;
    value.as_int().ok_or_else(|| {
        ControllerError::Failed(format!("'{}' resolved to non-integer {value}", attribute.name()))
    })
}

fn included_groups(group: &mgmt_tree::Resource) -> Vec<String> {
    group
        .attribute(INCLUDES)
        .as_list()
        .map(|items| items.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Check that the current binding's name is free in its group's name space
///
/// On a server the binding's group is read by name and not followed
/// further. Elsewhere the check tolerates a missing parent and follows the
/// group's includes, skipping groups that do not exist.
///
/// # Errors
/// [`TreeError::DuplicateName`] naming the collection already holding the
/// name.
pub(crate) fn check_binding_name(
    context: &OperationContext,
    kind: &str,
) -> Result<(), ControllerError> {
    let address = context.current_address().clone();
    let (Some(parent), Some(element)) = (address.parent(), address.last_element()) else {
        return Ok(());
    };
    let name = element.value();

    if context.process_type().is_server() {
        let group_name = parent.last_element().map(|e| e.value()).unwrap_or_default();
        let group_address = Address::root().append(SOCKET_BINDING_GROUP, group_name);
        let group = context.read_resource_from_root(&group_address, false)?;
        SOCKET_BINDING_NAMESPACE.check(&group, &group_address, kind, name)?;
        return Ok(());
    }

    let start = parent.last_element().map(|e| e.value()).unwrap_or_default();
    let mut first = true;
    let visited = walk_inclusions(start, |group_name: &str| -> Result<_, ControllerError> {
        let group_address = if std::mem::take(&mut first) {
            parent.clone()
        } else {
            Address::root().append(SOCKET_BINDING_GROUP, group_name)
        };
        let group = match context.read_resource_from_root(&group_address, false) {
            Ok(group) => group,
            Err(ControllerError::Tree(TreeError::NoSuchResource { .. })) => return Ok(None),
            Err(e) => return Err(e),
        };
        SOCKET_BINDING_NAMESPACE.check(&group, &group_address, kind, name)?;
        Ok(Some(included_groups(&group)))
    })?;
    debug!(binding = %address, groups = visited.len(), "binding name checked");
    Ok(())
}
