//! Model controller
//!
//! [`ModelController::execute`] runs one request through the staged
//! pipeline: model steps, then the tree transaction is rebased under the
//! commit lock, then runtime steps when any were queued and verify steps,
//! followed by publication of the tree and the capability changes. Any
//! failure rolls the request back exactly once.

use crate::config::ControllerConfig;
use crate::context::OperationContext;
use crate::error::{ControllerError, OperationFailed};
use crate::process::{ProcessType, RunningMode};
use crate::registry::OperationRegistry;
use crate::state::Stage;
use crate::{global, net};
use mgmt_capability::{CapabilityRegistration, CapabilityRegistry, CapabilityScope};
use mgmt_model::{Address, OperationRequest};
use mgmt_service::{ServiceContainer, ServiceMode, ServiceNode};
use mgmt_tree::{Resource, ResourceTree};
use mgmt_validation::PropertyResolver;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// State shared by the controller and every request context
pub(crate) struct Shared {
    pub(crate) tree: ResourceTree,
    pub(crate) capabilities: CapabilityRegistry,
    pub(crate) container: Arc<dyn ServiceContainer>,
    pub(crate) operations: OperationRegistry,
    pub(crate) resolver: PropertyResolver,
    pub(crate) process_type: ProcessType,
    pub(crate) running_mode: RunningMode,
}

/// Result of a committed request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OperationOutcome {
    /// Value set by the handlers
    pub result: serde_json::Value,
    /// Committed tree version after the request
    pub version: u64,
    /// Whether the change needs a reload to take effect
    pub reload_required: bool,
}

impl OperationOutcome {
    /// JSON form reported by the CLI
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "outcome": "success",
            "result": self.result,
            "version": self.version,
            "reload-required": self.reload_required,
        })
    }
}

/// Entry point executing management requests
#[derive(Clone)]
pub struct ModelController {
    shared: Arc<Shared>,
}

impl ModelController {
    /// Controller with the standard network resources and global operations
    ///
    /// # Errors
    /// Bootstrap failures.
    pub fn new(
        config: &ControllerConfig,
        container: Arc<dyn ServiceContainer>,
    ) -> Result<Self, ControllerError> {
        Self::with_operations(config, container, Self::standard_operations())
    }

    /// Registry with the standard network resources and global operations
    #[must_use]
    pub fn standard_operations() -> OperationRegistry {
        let mut operations = OperationRegistry::new();
        global::register(&mut operations);
        net::register(&mut operations);
        operations
    }

    /// Controller with a caller-built operation registry
    ///
    /// Registers the socket binding manager capability and installs its
    /// service; a host controller with a host name also gets `/host=<name>`.
    ///
    /// # Errors
    /// Bootstrap failures.
    pub fn with_operations(
        config: &ControllerConfig,
        container: Arc<dyn ServiceContainer>,
        operations: OperationRegistry,
    ) -> Result<Self, ControllerError> {
        let mut root = Resource::default();
        if config.process_type == ProcessType::HostController {
            if let Some(host) = &config.host_name {
                root.set_child(net::HOST, host, Resource::default());
            }
        }

        let capabilities = CapabilityRegistry::new();
        let manager = &net::SOCKET_BINDING_MANAGER_CAPABILITY;
        capabilities.register(CapabilityRegistration::new(
            manager.clone(),
            None,
            CapabilityScope::Global,
            Address::root(),
        ))?;
        container.register(
            ServiceNode::builder(
                manager.service_name(None),
                Arc::new(net::services::SocketBindingManager),
            )
            .initial_mode(ServiceMode::Active)
            .build(),
        )?;

        info!(
            process = ?config.process_type,
            mode = ?config.running_mode,
            host = config.host_name.as_deref().unwrap_or("-"),
            "model controller started"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                tree: ResourceTree::with_root(root),
                capabilities,
                container,
                operations,
                resolver: PropertyResolver::new(config.properties.clone()),
                process_type: config.process_type,
                running_mode: config.running_mode,
            }),
        })
    }

    /// Committed resource tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ResourceTree {
        &self.shared.tree
    }

    /// Committed capability registrations
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.shared.capabilities
    }

    /// Service container
    #[inline]
    #[must_use]
    pub fn container(&self) -> &Arc<dyn ServiceContainer> {
        &self.shared.container
    }

    /// Registered operations
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &OperationRegistry {
        &self.shared.operations
    }

    /// Kind of process
    #[inline]
    #[must_use]
    pub fn process_type(&self) -> ProcessType {
        self.shared.process_type
    }

    /// Execute one request
    ///
    /// # Errors
    /// [`OperationFailed`] after the request was rolled back.
    pub fn execute(&self, request: OperationRequest) -> Result<OperationOutcome, OperationFailed> {
        let mut context = OperationContext::new(Arc::clone(&self.shared), request.clone());
        match self.run(&mut context) {
            Ok(version) => {
                info!(operation = %request, version, "operation committed");
                Ok(OperationOutcome {
                    result: context.result().clone(),
                    version,
                    reload_required: context.is_reload_required(),
                })
            }
            Err(cause) => {
                let address = context.current_address().clone();
                let warnings = context.rollback();
                warn!(operation = %request, address = %address, error = %cause, "operation rolled back");
                Err(OperationFailed::new(&request, address, cause, warnings))
            }
        }
    }

    fn run(&self, context: &mut OperationContext) -> Result<u64, ControllerError> {
        let request = context.request().clone();
        let handler = self
            .shared
            .operations
            .find(request.address(), request.operation())
            .ok_or_else(|| ControllerError::UnknownOperation {
                operation: request.operation().to_string(),
                address: request.address().clone(),
            })?;
        context.add_step(Stage::Model, request, handler)?;
        context.run_stage(Stage::Model)?;

        // services are only touched once the write set applies to the latest tree
        let guard = self.shared.tree.prepare(context.tree_mut())?;
        if context.has_steps(Stage::Runtime) {
            context.run_stage(Stage::Runtime)?;
        }
        context.run_stage(Stage::Verify)?;
        self.shared
            .capabilities
            .apply(context.capability_changes())?;
        let version = guard.publish(context.tree_mut())?;
        context.mark_committed()?;
        Ok(version)
    }

    /// JSON dump of the committed model
    #[must_use]
    pub fn dump_model(&self) -> serde_json::Value {
        self.shared.tree.snapshot().to_json(true)
    }
}

impl std::fmt::Debug for ModelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelController")
            .field("process_type", &self.shared.process_type)
            .field("running_mode", &self.shared.running_mode)
            .field("version", &self.shared.tree.version())
            .field("operations", &self.shared.operations)
            .finish_non_exhaustive()
    }
}
