//! Service Graph
//!
//! Runtime service identities and the wiring handed to the scheduler.
//!
//! # Overview
//!
//! - **ServiceName**: hierarchical dotted identity
//! - **ServiceNode**: service value, dependency edges with injection targets,
//!   initial mode and aliases
//! - **ServiceBatch**: per-operation graph builder rejecting cycles
//! - **ServiceContainer**: scheduler seam with an in-memory implementation

#![warn(missing_docs)]

pub mod batch;
pub mod container;
pub mod error;
pub mod name;
pub mod node;

// Re-exports
pub use batch::ServiceBatch;
pub use container::{InMemoryServiceContainer, ServiceContainer};
pub use error::ServiceError;
pub use name::ServiceName;
pub use node::{Dependency, InjectionTarget, Service, ServiceBuilder, ServiceMode, ServiceNode};
