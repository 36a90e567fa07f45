//! Capability Registry
//!
//! Capabilities decouple a resource's runtime service from the resources that
//! depend on it: dependents name a capability (plus a dynamic part) and the
//! registry resolves it to a service name, subject to scope and value type.
//!
//! # Example
//!
//! ```rust
//! use mgmt_capability::{CapabilityRegistration, CapabilityRegistry, CapabilityScope, RuntimeCapability};
//! use mgmt_model::Address;
//!
//! const SOCKET_BINDING: RuntimeCapability =
//!     RuntimeCapability::dynamic("org.wildfly.network.socket-binding", "SocketBinding");
//!
//! let registry = CapabilityRegistry::new();
//! let registrant: Address = "/socket-binding-group=standard/socket-binding=http".parse().unwrap();
//! registry
//!     .register(CapabilityRegistration::new(
//!         SOCKET_BINDING,
//!         Some("http".into()),
//!         CapabilityScope::Global,
//!         registrant.clone(),
//!     ))
//!     .unwrap();
//!
//! let service = registry
//!     .resolve_capability_service_name(SOCKET_BINDING.name(), Some("http"), "SocketBinding", &registrant)
//!     .unwrap();
//! assert_eq!(service.to_string(), "org.wildfly.network.socket-binding.http");
//! ```

#![warn(missing_docs)]

pub mod capability;
pub mod error;
pub mod registry;

// Re-exports
pub use capability::{CapabilityRegistration, CapabilityScope, RuntimeCapability};
pub use error::CapabilityError;
pub use registry::{CapabilityChange, CapabilityChanges, CapabilityRegistry};
