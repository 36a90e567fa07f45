//! Resource Tree
//!
//! Hierarchical, transactional store of management resources.
//!
//! # Overview
//!
//! - **Resource**: persistent node with attributes and named child collections
//! - **ResourceTree**: versioned committed root shared by all requests
//! - **TreeTransaction**: per-request working copy with write set and undo log
//! - **SharedNamespace** / **walk_inclusions**: cross-collection name checks and
//!   cycle-safe traversal of group inclusions
//!
//! # Example
//!
//! ```rust
//! use mgmt_model::Address;
//! use mgmt_tree::{AttributeMap, ResourceTree};
//!
//! let tree = ResourceTree::new();
//! let mut tx = tree.begin();
//! tx.add_child(&Address::root(), "interface", "public", AttributeMap::new()).unwrap();
//! tree.prepare(&mut tx).unwrap().publish(&mut tx).unwrap();
//! assert!(tree.read(&"/interface=public".parse().unwrap(), false).is_ok());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod namespace;
pub mod resource;
pub mod tree;

// Re-exports
pub use error::TreeError;
pub use namespace::{walk_inclusions, SharedNamespace};
pub use resource::{AttributeMap, Resource};
pub use tree::{
    CommitGuard, ResourceTree, TransactionId, TransactionState, TreeTransaction, UndoEntry,
    WriteOp,
};
