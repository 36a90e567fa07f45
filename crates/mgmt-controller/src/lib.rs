//! Management Controller
//!
//! Executes configuration requests against the management model through a
//! staged, transactional pipeline, and defines the network resources
//! (interfaces, socket binding groups, inbound and outbound socket bindings).
//!
//! # Overview
//!
//! - **Pipeline**: model, runtime and verify stages with rollback on failure
//! - **Steps**: handlers queue further steps; nested steps run next
//! - **Registry**: handlers by address pattern with `*` wildcards
//! - **Network resources**: shared binding name space, capability wiring
//!
//! # Example
//!
//! ```rust
//! use mgmt_controller::{ControllerConfig, ModelController};
//! use mgmt_model::{Address, OperationRequest};
//! use mgmt_service::InMemoryServiceContainer;
//! use std::sync::Arc;
//!
//! let controller = ModelController::new(
//!     &ControllerConfig::default(),
//!     Arc::new(InMemoryServiceContainer::new()),
//! )
//! .unwrap();
//!
//! let public = Address::root().append("interface", "public");
//! controller
//!     .execute(OperationRequest::new(public, "add").with_param("inet-address", "127.0.0.1"))
//!     .unwrap();
//!
//! let group = Address::root().append("socket-binding-group", "standard");
//! controller
//!     .execute(OperationRequest::new(group.clone(), "add").with_param("default-interface", "public"))
//!     .unwrap();
//!
//! let smtp = group.append("remote-destination-outbound-socket-binding", "mail-smtp");
//! let outcome = controller
//!     .execute(
//!         OperationRequest::new(smtp, "add")
//!             .with_param("host", "localhost")
//!             .with_param("port", 25),
//!     )
//!     .unwrap();
//! assert_eq!(outcome.version, 3);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod global;
pub mod handlers;
pub mod logging;
pub mod net;
pub mod process;
pub mod registry;
pub mod state;
pub mod step;

// Re-exports
pub use config::{ControllerConfig, LogFormat};
pub use context::{OperationContext, RollbackAction};
pub use controller::{ModelController, OperationOutcome};
pub use error::{ControllerError, OperationFailed};
pub use handlers::{AddStepHandler, RemoveStepHandler, ResourceHandler};
pub use process::{ProcessType, RunningMode};
pub use registry::OperationRegistry;
pub use state::{Stage, TransactionState};
pub use step::OperationStepHandler;
