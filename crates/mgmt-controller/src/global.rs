//! Operations available at every address

use crate::context::OperationContext;
use crate::error::ControllerError;
use crate::registry::OperationRegistry;
use mgmt_model::{names, ModelType, ModelValue, OperationRequest};
use mgmt_validation::{AttributeDefinition, AttributeDefinitionBuilder, StringLengthValidator};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

fn recursive_parameter() -> AttributeDefinition {
    AttributeDefinitionBuilder::new("recursive", ModelType::Boolean)
        .default_value(false)
        .description("Include children with their attributes")
        .build()
}

fn name_parameter() -> AttributeDefinition {
    AttributeDefinitionBuilder::new("name", ModelType::String)
        .required(true)
        .validator(Arc::new(StringLengthValidator::non_empty()))
        .description("Attribute to write")
        .build()
}

/// Register `read-resource` and `write-attribute`
pub fn register(registry: &mut OperationRegistry) {
    registry.register_global(names::READ_RESOURCE, Arc::new(read_resource));
    registry.register_global(names::WRITE_ATTRIBUTE, Arc::new(write_attribute));
}

/// Read the addressed resource's attributes, and children if `recursive`
///
/// # Errors
/// [`mgmt_tree::TreeError::NoSuchResource`] if the resource is missing.
pub fn read_resource(
    context: &mut OperationContext,
    operation: &OperationRequest,
) -> Result<(), ControllerError> {
    let mut params = BTreeMap::new();
    let recursive_parameter = recursive_parameter();
    recursive_parameter.validate_and_set(operation, &mut params)?;
    let recursive = recursive_parameter
        .resolve_model_attribute(context.resolver(), &ModelValue::Object(params))?
        .as_bool()
        .unwrap_or(false);

    let resource = context.read_resource(recursive)?;
    context.set_result(resource.to_json(recursive));
    Ok(())
}

/// Change one attribute of the addressed resource
///
/// The new value passes the attribute's validator chain; an undefined value
/// clears the attribute. The change applies to the model only and flags the
/// process as requiring a reload.
///
/// # Errors
/// Unknown attribute, validation failures or a missing resource.
pub fn write_attribute(
    context: &mut OperationContext,
    operation: &OperationRequest,
) -> Result<(), ControllerError> {
    let address = operation.address().clone();
    name_parameter().validate_and_set(operation, &mut BTreeMap::new())?;
    let name = operation.param("name").to_string();

    let definition = context
        .operations()
        .resource(&address)
        .ok_or_else(|| ControllerError::UnknownOperation {
            operation: names::WRITE_ATTRIBUTE.to_string(),
            address: address.clone(),
        })?;
    let attribute = definition
        .attributes()
        .iter()
        .find(|a| a.name() == name)
        .ok_or_else(|| ControllerError::UnknownAttribute {
            name: name.clone(),
            address: address.clone(),
        })?;

    let value = operation.param("value").clone();
    let write = OperationRequest::new(address.clone(), names::WRITE_ATTRIBUTE)
        .with_param(name.as_str(), value.clone());
    let mut model: BTreeMap<String, ModelValue> = context
        .read_resource(false)?
        .model()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let old = model.remove(&name).unwrap_or_default();
    attribute.validate_and_set(&write, &mut model)?;
    context.write_model(&address, model)?;
    context.set_reload_required();

    info!(address = %address, attribute = %name, old = %old, new = %value, "attribute written");
    context.set_result(serde_json::Value::Null);
    Ok(())
}
