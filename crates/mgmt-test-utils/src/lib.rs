//! Testing utilities for the management workspace
//!
//! Controller fixtures, request builders for the network resources and a
//! service container whose removals fail.

#![allow(missing_docs)]

use mgmt_controller::net::{
    HOST, INCLUDES, INTERFACE, LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING,
    REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING, SOCKET_BINDING, SOCKET_BINDING_GROUP,
};
use mgmt_controller::{ControllerConfig, ModelController};
use mgmt_model::{names, Address, ModelValue, OperationRequest};
use mgmt_service::{InMemoryServiceContainer, ServiceContainer, ServiceError, ServiceName, ServiceNode};
use std::sync::Arc;

pub fn standalone() -> (ModelController, Arc<InMemoryServiceContainer>) {
    with_config(&ControllerConfig::default())
}

pub fn host_controller(host: &str) -> (ModelController, Arc<InMemoryServiceContainer>) {
    with_config(&ControllerConfig::host_controller(host))
}

pub fn with_config(config: &ControllerConfig) -> (ModelController, Arc<InMemoryServiceContainer>) {
    let container = Arc::new(InMemoryServiceContainer::new());
    let controller = ModelController::new(config, container.clone()).unwrap();
    (controller, container)
}

pub fn host(name: &str) -> Address {
    Address::root().append(HOST, name)
}

pub fn interface(base: &Address, name: &str) -> Address {
    base.append(INTERFACE, name)
}

pub fn group(base: &Address, name: &str) -> Address {
    base.append(SOCKET_BINDING_GROUP, name)
}

pub fn add_interface(base: &Address, name: &str, inet_address: &str) -> OperationRequest {
    OperationRequest::new(interface(base, name), names::ADD).with_param("inet-address", inet_address)
}

pub fn add_group(base: &Address, name: &str, default_interface: &str) -> OperationRequest {
    OperationRequest::new(group(base, name), names::ADD)
        .with_param("default-interface", default_interface)
}

pub fn add_group_including(
    base: &Address,
    name: &str,
    default_interface: &str,
    includes: &[&str],
) -> OperationRequest {
    add_group(base, name, default_interface).with_param(
        INCLUDES,
        includes.iter().map(|g| (*g).to_string()).collect::<Vec<_>>(),
    )
}

pub fn add_socket_binding(group: &Address, name: &str, port: i64) -> OperationRequest {
    OperationRequest::new(group.append(SOCKET_BINDING, name), names::ADD).with_param("port", port)
}

pub fn add_remote_outbound(group: &Address, name: &str, host: &str, port: i64) -> OperationRequest {
    OperationRequest::new(
        group.append(REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING, name),
        names::ADD,
    )
    .with_param("host", host)
    .with_param("port", port)
}

pub fn add_local_outbound(group: &Address, name: &str, socket_binding: &str) -> OperationRequest {
    OperationRequest::new(
        group.append(LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING, name),
        names::ADD,
    )
    .with_param("socket-binding-ref", socket_binding)
}

pub fn remove(address: Address) -> OperationRequest {
    OperationRequest::new(address, names::REMOVE)
}

pub fn write_attribute(address: Address, name: &str, value: impl Into<ModelValue>) -> OperationRequest {
    OperationRequest::new(address, names::WRITE_ATTRIBUTE)
        .with_param("name", name)
        .with_param("value", value)
}

/// Interface `public` and group `standard` under `base`, returning the group address
pub fn seed_standard(controller: &ModelController, base: &Address) -> Address {
    controller
        .execute(add_interface(base, "public", "127.0.0.1"))
        .unwrap();
    controller
        .execute(add_group(base, "standard", "public"))
        .unwrap();
    group(base, "standard")
}

pub fn service(name: &str) -> ServiceName {
    ServiceName::parse(name)
}

/// Container that registers normally but refuses every removal
#[derive(Debug, Default)]
pub struct FailingRemovalContainer {
    pub inner: InMemoryServiceContainer,
}

impl ServiceContainer for FailingRemovalContainer {
    fn register(&self, node: ServiceNode) -> Result<(), ServiceError> {
        self.inner.register(node)
    }

    fn remove(&self, name: &ServiceName) -> Result<ServiceNode, ServiceError> {
        Err(ServiceError::Unknown { name: name.clone() })
    }

    fn contains(&self, name: &ServiceName) -> bool {
        self.inner.contains(name)
    }
}
