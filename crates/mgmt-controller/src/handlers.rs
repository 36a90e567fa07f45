//! Resource definitions and the generic add/remove handlers
//!
//! A [`ResourceHandler`] describes one resource type: its attributes, the
//! capability it provides and its runtime behaviour. [`AddStepHandler`] and
//! [`RemoveStepHandler`] turn it into `add` and `remove` operations.

use crate::context::{OperationContext, RollbackAction};
use crate::error::ControllerError;
use crate::state::Stage;
use crate::step::OperationStepHandler;
use mgmt_capability::RuntimeCapability;
use mgmt_model::{ModelValue, OperationRequest};
use mgmt_service::ServiceContainer;
use mgmt_validation::AttributeDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Definition and runtime behaviour of one resource type
pub trait ResourceHandler: Send + Sync {
    /// Attributes stored in the model
    fn attributes(&self) -> &[AttributeDefinition];

    /// Capability registered per resource, named after the resource
    fn capability(&self) -> Option<&RuntimeCapability> {
        None
    }

    /// Validate the request and fill the new resource's model
    ///
    /// May queue further model or verify steps.
    ///
    /// # Errors
    /// Validation failures.
    fn populate_model(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        model: &mut BTreeMap<String, ModelValue>,
    ) -> Result<(), ControllerError> {
        let _ = context;
        for attribute in self.attributes() {
            attribute.validate_and_set(operation, model)?;
        }
        Ok(())
    }

    /// Check if the runtime stage should run for this request
    fn requires_runtime(&self, context: &OperationContext) -> bool {
        context.is_default_requires_runtime()
    }

    /// Install the services backing a new resource
    ///
    /// # Errors
    /// Resolution, capability or service failures.
    fn perform_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let _ = (context, operation, model);
        Ok(())
    }

    /// Undo runtime effects not covered by service compensations
    ///
    /// # Errors
    /// Failures are reported as rollback warnings.
    fn rollback_runtime(
        &self,
        container: &dyn ServiceContainer,
        operation: &OperationRequest,
        model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let _ = (container, operation, model);
        Ok(())
    }

    /// Remove the services backing a removed resource
    ///
    /// # Errors
    /// Service failures.
    fn perform_remove_runtime(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
        model: &ModelValue,
    ) -> Result<(), ControllerError> {
        let _ = (context, operation, model);
        Ok(())
    }
}

fn dynamic_part<'a>(
    capability: &RuntimeCapability,
    operation: &'a OperationRequest,
) -> Option<&'a str> {
    if capability.is_dynamic() {
        operation.address().last_element().map(|e| e.value())
    } else {
        None
    }
}

/// `add` operation for a [`ResourceHandler`]
pub struct AddStepHandler {
    handler: Arc<dyn ResourceHandler>,
}

impl AddStepHandler {
    /// Add handler for `handler`'s resource type
    #[must_use]
    pub fn new(handler: Arc<dyn ResourceHandler>) -> Self {
        Self { handler }
    }
}

impl OperationStepHandler for AddStepHandler {
    fn execute(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
    ) -> Result<(), ControllerError> {
        let address = operation.address().clone();
        let mut model = BTreeMap::new();
        self.handler.populate_model(context, operation, &mut model)?;
        context.add_resource(&address, model)?;

        if let Some(capability) = self.handler.capability() {
            context.register_capability(capability, dynamic_part(capability, operation))?;
        }

        if self.handler.requires_runtime(context) {
            let handler = Arc::clone(&self.handler);
            context.add_step_fn(
                Stage::Runtime,
                operation.clone(),
                move |ctx: &mut OperationContext, op: &OperationRequest| {
                    let model = ctx.read_resource(false)?.model_value();
                    let compensating = Arc::clone(&handler);
                    let (op_copy, model_copy) = (op.clone(), model.clone());
                    ctx.add_compensation(RollbackAction::Custom(Box::new(
                        move |container: &dyn ServiceContainer| {
                            compensating.rollback_runtime(container, &op_copy, &model_copy)
                        },
                    )));
                    handler.perform_runtime(ctx, op, &model)
                },
            )?;
        } else {
            debug!(address = %address, "runtime stage not required");
        }
        Ok(())
    }
}

/// `remove` operation for a [`ResourceHandler`]
///
/// Resources with children must be emptied first.
pub struct RemoveStepHandler {
    handler: Arc<dyn ResourceHandler>,
}

impl RemoveStepHandler {
    /// Remove handler for `handler`'s resource type
    #[must_use]
    pub fn new(handler: Arc<dyn ResourceHandler>) -> Self {
        Self { handler }
    }
}

impl OperationStepHandler for RemoveStepHandler {
    fn execute(
        &self,
        context: &mut OperationContext,
        operation: &OperationRequest,
    ) -> Result<(), ControllerError> {
        let address = operation.address().clone();
        let children = context.read_resource(false)?.collection_names();
        if !children.is_empty() {
            return Err(ControllerError::Failed(format!(
                "cannot remove {address}: it still has {}",
                children.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }
        let removed = context.remove_resource(&address)?;

        if let Some(capability) = self.handler.capability() {
            context.deregister_capability(capability, dynamic_part(capability, operation));
        }

        if self.handler.requires_runtime(context) {
            let handler = Arc::clone(&self.handler);
            let model = removed.model_value();
            context.add_step_fn(
                Stage::Runtime,
                operation.clone(),
                move |ctx: &mut OperationContext, op: &OperationRequest| {
                    handler.perform_remove_runtime(ctx, op, &model)
                },
            )?;
        }
        Ok(())
    }
}
