//! Tree errors

use mgmt_model::Address;

/// Errors raised by resource tree reads and writes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// No resource at the address
    #[error("no resource at {address}")]
    NoSuchResource {
        /// Address that was looked up
        address: Address,
    },

    /// Name already used by a sibling in the same or a shared collection
    #[error("{existing} or {kind} named '{name}' is already declared in {parent}")]
    DuplicateName {
        /// Collection that already holds the name
        existing: String,
        /// Collection the new resource was added to
        kind: String,
        /// Contested name
        name: String,
        /// Group whose name space already holds it
        parent: Address,
    },

    /// Transaction was already committed or rolled back
    #[error("transaction {0} is closed")]
    TransactionClosed(crate::tree::TransactionId),
}

impl TreeError {
    /// Stable message key reported to callers
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NoSuchResource { .. } => "noSuchResource",
            Self::DuplicateName { .. } => "duplicateName",
            Self::TransactionClosed(_) => "transactionClosed",
        }
    }

    /// Duplicate name within a single collection
    #[must_use]
    pub fn duplicate(collection: &str, name: &str, parent: &Address) -> Self {
        Self::DuplicateName {
            existing: collection.to_string(),
            kind: collection.to_string(),
            name: name.to_string(),
            parent: parent.clone(),
        }
    }
}
