//! Per-request operation context
//!
//! An [`OperationContext`] is created for every request and handed to each
//! step. It owns the request's tree transaction, its staged capability
//! changes, its service batch and its compensation log, and exposes them to
//! handlers as one API.
//!
//! # Overview
//!
//! - Tree access: reads see the request's own writes
//! - Capabilities: registrations are staged and published at commit
//! - Services: installs are recorded so rollback can undo them
//! - Steps: handlers may queue further steps for any stage not yet finished

use crate::controller::Shared;
use crate::error::ControllerError;
use crate::process::{ProcessType, RunningMode};
use crate::registry::OperationRegistry;
use crate::state::{validate_transition, Stage, TransactionState};
use crate::step::{OperationStepHandler, Step, StepQueues};
use mgmt_capability::{CapabilityChanges, CapabilityRegistration, CapabilityScope, RuntimeCapability};
use mgmt_model::{Address, ModelValue, OperationRequest};
use mgmt_service::{ServiceBatch, ServiceContainer, ServiceError, ServiceName, ServiceNode};
use mgmt_tree::{Resource, TreeTransaction};
use mgmt_validation::{AttributeDefinition, ExpressionResolver};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type Compensation = Box<dyn FnOnce(&dyn ServiceContainer) -> Result<(), ControllerError> + Send>;

/// Compensation run when a request rolls back
pub enum RollbackAction {
    /// Remove a service this request installed
    RemoveService(ServiceName),
    /// Put back a service this request removed
    ReinstallService(ServiceNode),
    /// Handler-provided compensation
    Custom(Compensation),
}

impl RollbackAction {
    fn run(self, container: &dyn ServiceContainer) -> Result<(), ControllerError> {
        match self {
            Self::RemoveService(name) => container.remove(&name).map(|_| ())?,
            Self::ReinstallService(node) => container.register(node)?,
            Self::Custom(compensation) => compensation(container)?,
        }
        Ok(())
    }
}

impl fmt::Debug for RollbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveService(name) => f.debug_tuple("RemoveService").field(name).finish(),
            Self::ReinstallService(node) => {
                f.debug_tuple("ReinstallService").field(node.name()).finish()
            }
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Everything one request sees and changes
pub struct OperationContext {
    shared: Arc<Shared>,
    request: OperationRequest,
    current: OperationRequest,
    state: TransactionState,
    steps: StepQueues,
    tree: TreeTransaction,
    capabilities: CapabilityChanges,
    batch: ServiceBatch,
    compensations: Vec<RollbackAction>,
    result: serde_json::Value,
    reload_required: bool,
}

impl OperationContext {
    pub(crate) fn new(shared: Arc<Shared>, request: OperationRequest) -> Self {
        let tree = shared.tree.begin();
        Self {
            current: request.clone(),
            request,
            state: TransactionState::Received,
            steps: StepQueues::default(),
            tree,
            capabilities: CapabilityChanges::new(),
            batch: ServiceBatch::new(),
            compensations: Vec::new(),
            result: serde_json::Value::Null,
            reload_required: false,
            shared,
        }
    }

    /// Top-level request
    #[inline]
    #[must_use]
    pub fn request(&self) -> &OperationRequest {
        &self.request
    }

    /// Address of the step being executed
    #[inline]
    #[must_use]
    pub fn current_address(&self) -> &Address {
        self.current.address()
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Kind of process
    #[inline]
    #[must_use]
    pub fn process_type(&self) -> ProcessType {
        self.shared.process_type
    }

    /// Running mode
    #[inline]
    #[must_use]
    pub fn running_mode(&self) -> RunningMode {
        self.shared.running_mode
    }

    /// Default runtime predicate: a server in normal mode
    #[must_use]
    pub fn is_default_requires_runtime(&self) -> bool {
        self.shared.process_type.is_server() && self.shared.running_mode == RunningMode::Normal
    }

    /// Registered operations
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &OperationRegistry {
        &self.shared.operations
    }

    /// Resolver for `${...}` expressions
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &dyn ExpressionResolver {
        &self.shared.resolver
    }

    /// Resolve one attribute of a stored model
    ///
    /// # Errors
    /// Resolution or validation failures.
    pub fn resolve_attribute(
        &self,
        attribute: &AttributeDefinition,
        model: &ModelValue,
    ) -> Result<ModelValue, ControllerError> {
        Ok(attribute.resolve_model_attribute(&self.shared.resolver, model)?)
    }

    // ------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------

    /// Queue a step for `stage`
    ///
    /// # Errors
    /// [`ControllerError::Failed`] if `stage` already finished.
    pub fn add_step(
        &mut self,
        stage: Stage,
        operation: OperationRequest,
        handler: Arc<dyn OperationStepHandler>,
    ) -> Result<(), ControllerError> {
        self.steps.push(stage, Step::new(operation, handler))
    }

    /// Queue a closure step for `stage`
    ///
    /// # Errors
    /// As [`OperationContext::add_step`].
    pub fn add_step_fn<F>(
        &mut self,
        stage: Stage,
        operation: OperationRequest,
        handler: F,
    ) -> Result<(), ControllerError>
    where
        F: Fn(&mut OperationContext, &OperationRequest) -> Result<(), ControllerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_step(stage, operation, Arc::new(handler))
    }

    pub(crate) fn has_steps(&self, stage: Stage) -> bool {
        self.steps.has_steps(stage)
    }

    pub(crate) fn transition(&mut self, to: TransactionState) -> Result<(), ControllerError> {
        validate_transition(self.state, to)?;
        debug!(from = ?self.state, to = ?to, operation = %self.request, "stage transition");
        self.state = to;
        Ok(())
    }

    pub(crate) fn run_stage(&mut self, stage: Stage) -> Result<(), ControllerError> {
        self.transition(stage.state())?;
        self.steps.start(stage);
        while let Some(step) = self.steps.next() {
            self.current = step.operation.clone();
            debug!(stage = ?stage, step = %step.operation, "executing step");
            step.handler.execute(self, &step.operation)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Resource tree
    // ------------------------------------------------------------------

    /// Read the resource of the current step
    ///
    /// # Errors
    /// [`mgmt_tree::TreeError::NoSuchResource`] if it does not exist.
    pub fn read_resource(&self, recursive: bool) -> Result<Resource, ControllerError> {
        Ok(self.tree.read(self.current.address(), recursive)?)
    }

    /// Read any resource, seeing this request's writes
    ///
    /// # Errors
    /// [`mgmt_tree::TreeError::NoSuchResource`] if it does not exist.
    pub fn read_resource_from_root(
        &self,
        address: &Address,
        recursive: bool,
    ) -> Result<Resource, ControllerError> {
        Ok(self.tree.read(address, recursive)?)
    }

    /// Child names of a collection
    ///
    /// # Errors
    /// [`mgmt_tree::TreeError::NoSuchResource`] if `address` is missing.
    pub fn children_names(
        &self,
        address: &Address,
        collection: &str,
    ) -> Result<BTreeSet<String>, ControllerError> {
        Ok(self.tree.children_names(address, collection)?)
    }

    /// Create the resource at `address`
    ///
    /// # Errors
    /// Missing parent or duplicate name.
    pub fn add_resource(
        &mut self,
        address: &Address,
        model: BTreeMap<String, ModelValue>,
    ) -> Result<(), ControllerError> {
        let (parent, element) = split(address)?;
        self.tree
            .add_child(&parent, element.key(), element.value(), model.into_iter().collect())?;
        Ok(())
    }

    /// Remove the resource at `address` and its subtree
    ///
    /// # Errors
    /// [`mgmt_tree::TreeError::NoSuchResource`] if it does not exist.
    pub fn remove_resource(&mut self, address: &Address) -> Result<Resource, ControllerError> {
        let (parent, element) = split(address)?;
        Ok(self
            .tree
            .remove_child(&parent, element.key(), element.value())?)
    }

    /// Replace the attributes of the resource at `address`
    ///
    /// # Errors
    /// [`mgmt_tree::TreeError::NoSuchResource`] if it does not exist.
    pub fn write_model(
        &mut self,
        address: &Address,
        model: BTreeMap<String, ModelValue>,
    ) -> Result<(), ControllerError> {
        self.tree.write_model(address, model.into_iter().collect())?;
        Ok(())
    }

    pub(crate) fn tree_mut(&mut self) -> &mut TreeTransaction {
        &mut self.tree
    }

    // ------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------

    /// Stage a registration of `capability` by the current resource
    ///
    /// # Errors
    /// [`mgmt_capability::CapabilityError::AlreadyRegistered`] on a clash.
    pub fn register_capability(
        &mut self,
        capability: &RuntimeCapability,
        dynamic: Option<&str>,
    ) -> Result<(), ControllerError> {
        let registrant = self.current.address().clone();
        let scope = CapabilityScope::for_address(&registrant, self.shared.process_type.is_server());
        let registration = CapabilityRegistration::new(
            capability.clone(),
            dynamic.map(str::to_string),
            scope,
            registrant,
        );
        self.capabilities
            .register(&self.shared.capabilities, registration)?;
        Ok(())
    }

    /// Stage removal of the current resource's registration of `capability`
    pub fn deregister_capability(&mut self, capability: &RuntimeCapability, dynamic: Option<&str>) {
        self.capabilities
            .remove(capability.qualified_name(dynamic), self.current.address());
    }

    /// Resolve a capability to its service name, from the current address
    ///
    /// # Errors
    /// Capability missing, out of scope or of another type.
    pub fn resolve_capability_service_name(
        &self,
        name: &str,
        dynamic: Option<&str>,
        expected_type: &str,
    ) -> Result<ServiceName, ControllerError> {
        Ok(self.capabilities.resolve_capability_service_name(
            &self.shared.capabilities,
            name,
            dynamic,
            expected_type,
            self.current.address(),
        )?)
    }

    pub(crate) fn capability_changes(&self) -> &CapabilityChanges {
        &self.capabilities
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Install a service, undone on rollback
    ///
    /// # Errors
    /// Duplicate name or a dependency cycle within this request.
    pub fn install_service(&mut self, node: ServiceNode) -> Result<(), ControllerError> {
        self.batch.add(&node)?;
        let name = node.name().clone();
        self.shared.container.register(node)?;
        debug!(service = %name, "service installed");
        self.compensations.push(RollbackAction::RemoveService(name));
        Ok(())
    }

    /// Remove a service, reinstalled on rollback
    ///
    /// Returns `None` if nothing was installed under `name`.
    ///
    /// # Errors
    /// Container failures other than an unknown name.
    pub fn remove_service(&mut self, name: &ServiceName) -> Result<Option<ServiceNode>, ControllerError> {
        match self.shared.container.remove(name) {
            Ok(node) => {
                debug!(service = %name, "service removed");
                self.compensations
                    .push(RollbackAction::ReinstallService(node.clone()));
                Ok(Some(node))
            }
            Err(ServiceError::Unknown { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Register a compensation run if the request rolls back
    pub fn add_compensation(&mut self, action: RollbackAction) {
        self.compensations.push(action);
    }

    // ------------------------------------------------------------------
    // Outcome
    // ------------------------------------------------------------------

    /// Set the result returned to the caller
    pub fn set_result(&mut self, result: serde_json::Value) {
        self.result = result;
    }

    /// Result set so far
    #[inline]
    #[must_use]
    pub fn result(&self) -> &serde_json::Value {
        &self.result
    }

    /// Flag that the change only takes effect after a reload
    pub fn set_reload_required(&mut self) {
        self.reload_required = true;
    }

    /// Check if a reload is required
    #[inline]
    #[must_use]
    pub fn is_reload_required(&self) -> bool {
        self.reload_required
    }

    pub(crate) fn mark_committed(&mut self) -> Result<(), ControllerError> {
        self.transition(TransactionState::Committed)?;
        self.compensations.clear();
        Ok(())
    }

    /// Undo everything the request did
    ///
    /// Runs once; later calls return no warnings. Compensations run in
    /// reverse order and their failures are returned as warnings.
    pub(crate) fn rollback(&mut self) -> Vec<String> {
        if matches!(
            self.state,
            TransactionState::Committed | TransactionState::RolledBack
        ) {
            return Vec::new();
        }
        self.tree.rollback();
        self.capabilities.clear();

        let mut warnings = Vec::new();
        while let Some(action) = self.compensations.pop() {
            let label = format!("{action:?}");
            if let Err(e) = action.run(self.shared.container.as_ref()) {
                warn!(compensation = %label, error = %e, "compensation failed during rollback");
                warnings.push(format!("{label}: {e}"));
            }
        }
        self.state = TransactionState::RolledBack;
        debug!(operation = %self.request, warnings = warnings.len(), "request rolled back");
        warnings
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("request", &self.request.to_string())
            .field("state", &self.state)
            .field("current", &self.current.address().to_string())
            .field("compensations", &self.compensations.len())
            .finish_non_exhaustive()
    }
}

fn split(address: &Address) -> Result<(Address, mgmt_model::PathElement), ControllerError> {
    match (address.parent(), address.last_element()) {
        (Some(parent), Some(element)) => Ok((parent, element.clone())),
        _ => Err(ControllerError::Failed(format!(
            "{address} does not name a child resource"
        ))),
    }
}
