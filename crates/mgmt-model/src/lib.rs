//! Management Model
//!
//! Leaf data types shared by every layer of the management core.
//!
//! # Overview
//!
//! - **Address**: ordered `(key, value)` path identifying a resource
//! - **ModelValue**: tagged union stored in attributes and parameters
//! - **OperationRequest**: address + operation name + parameters
//!
//! # Example
//!
//! ```rust
//! use mgmt_model::{Address, OperationRequest};
//!
//! let address: Address = "/socket-binding-group=standard".parse().unwrap();
//! let op = OperationRequest::new(address.append("socket-binding", "http"), "add")
//!     .with_param("port", 8080);
//! assert_eq!(op.param("port").as_int(), Some(8080));
//! ```

#![warn(missing_docs)]

pub mod address;
pub mod operation;
pub mod value;

// Re-exports
pub use address::{Address, AddressError, PathElement};
pub use operation::{names, OperationRequest};
pub use value::{is_expression_string, ModelType, ModelValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
