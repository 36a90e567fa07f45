//! Multi-version resource tree
//!
//! The committed root is a persistent [`Resource`] behind a read/write lock.
//! A [`TreeTransaction`] starts from a snapshot of it and records a write set
//! and an undo log. Commits are serialized by a commit lock: [`ResourceTree::prepare`]
//! takes the lock and, if another transaction committed in the meantime,
//! replays the write set onto the latest root. [`CommitGuard::publish`] then
//! swaps the root in.
//!
//! Attribute writes are recorded per attribute, so replaying them merges with
//! attributes another transaction committed on the same resource.

use crate::error::TreeError;
use crate::resource::{AttributeMap, Resource};
use mgmt_model::{Address, ModelValue};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// Identifier of a tree transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded tree mutation, replayable onto another root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Add a child under `parent`
    AddChild {
        /// Parent resource
        parent: Address,
        /// Child collection
        collection: String,
        /// Child name
        name: String,
        /// Initial attributes
        model: AttributeMap,
    },
    /// Remove a child of `parent`
    RemoveChild {
        /// Parent resource
        parent: Address,
        /// Child collection
        collection: String,
        /// Child name
        name: String,
    },
    /// Set one attribute of the resource at `address`; `None` unsets it
    WriteAttribute {
        /// Target resource
        address: Address,
        /// Attribute name
        name: String,
        /// New value
        value: Option<ModelValue>,
    },
}

/// Undo log entry: the state of `address` before a write
#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// Address the write touched
    pub address: Address,
    /// Prior resource; `None` if the address did not exist
    pub prior: Option<Resource>,
}

fn apply(root: &mut Resource, op: &WriteOp) -> Result<UndoEntry, TreeError> {
    match op {
        WriteOp::AddChild {
            parent,
            collection,
            name,
            model,
        } => {
            let node = root
                .navigate_mut(parent)
                .ok_or_else(|| TreeError::NoSuchResource {
                    address: parent.clone(),
                })?;
            if node.has_child(collection, name) {
                return Err(TreeError::duplicate(collection, name, parent));
            }
            let mut child = Resource::default();
            child.set_model(model.clone());
            node.set_child(collection, name, child);
            Ok(UndoEntry {
                address: parent.append(collection.as_str(), name.as_str()),
                prior: None,
            })
        }
        WriteOp::RemoveChild {
            parent,
            collection,
            name,
        } => {
            let address = parent.append(collection.as_str(), name.as_str());
            let removed = root
                .navigate_mut(parent)
                .and_then(|node| node.remove_child(collection, name))
                .ok_or_else(|| TreeError::NoSuchResource {
                    address: address.clone(),
                })?;
            Ok(UndoEntry {
                address,
                prior: Some(removed),
            })
        }
        WriteOp::WriteAttribute {
            address,
            name,
            value,
        } => {
            let node = root
                .navigate_mut(address)
                .ok_or_else(|| TreeError::NoSuchResource {
                    address: address.clone(),
                })?;
            let prior = node.clone();
            let mut model = node.model().clone();
            match value {
                Some(value) => model.insert(name.clone(), value.clone()),
                None => model.remove(name),
            };
            node.set_model(model);
            Ok(UndoEntry {
                address: address.clone(),
                prior: Some(prior),
            })
        }
    }
}

fn restore(root: &mut Resource, entry: UndoEntry) {
    let Some(last) = entry.address.last_element() else {
        if let Some(prior) = entry.prior {
            *root = prior;
        }
        return;
    };
    let parent = entry.address.parent().unwrap_or_default();
    if let Some(node) = root.navigate_mut(&parent) {
        match entry.prior {
            Some(prior) => node.set_child(last.key(), last.value(), prior),
            None => {
                node.remove_child(last.key(), last.value());
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    root: Resource,
    version: u64,
}

/// Shared, versioned resource tree
#[derive(Debug, Default)]
pub struct ResourceTree {
    committed: RwLock<Snapshot>,
    commit_lock: Mutex<()>,
}

impl ResourceTree {
    /// Empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with an initial root
    #[must_use]
    pub fn with_root(root: Resource) -> Self {
        Self {
            committed: RwLock::new(Snapshot { root, version: 0 }),
            commit_lock: Mutex::new(()),
        }
    }

    /// Current committed version
    #[must_use]
    pub fn version(&self) -> u64 {
        self.committed.read().version
    }

    /// Snapshot of the committed root
    #[must_use]
    pub fn snapshot(&self) -> Resource {
        self.committed.read().root.clone()
    }

    /// Read a committed resource
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if nothing exists at `address`.
    pub fn read(&self, address: &Address, recursive: bool) -> Result<Resource, TreeError> {
        read_at(&self.committed.read().root, address, recursive)
    }

    /// Start a transaction on the latest committed snapshot
    #[must_use]
    pub fn begin(&self) -> TreeTransaction {
        let snapshot = self.committed.read().clone();
        let tx = TreeTransaction {
            id: TransactionId::new(),
            base_version: snapshot.version,
            working: snapshot.root,
            writes: Vec::new(),
            undo: Vec::new(),
            state: TransactionState::Active,
        };
        debug!(transaction = %tx.id, version = tx.base_version, "tree transaction started");
        tx
    }

    /// Take the commit lock and rebase `tx` onto the latest committed root
    ///
    /// Reads through `tx` observe the rebased tree until the guard is
    /// published or dropped. On error `tx` is left untouched.
    ///
    /// # Errors
    /// [`TreeError::DuplicateName`] or [`TreeError::NoSuchResource`] when the
    /// write set no longer applies, [`TreeError::TransactionClosed`] if `tx`
    /// already finished.
    pub fn prepare(&self, tx: &mut TreeTransaction) -> Result<CommitGuard<'_>, TreeError> {
        tx.ensure_active()?;
        let lock = self.commit_lock.lock();
        let latest = self.committed.read().clone();
        if latest.version != tx.base_version {
            debug!(
                transaction = %tx.id,
                from = tx.base_version,
                to = latest.version,
                writes = tx.writes.len(),
                "rebasing write set"
            );
            tx.rebase(latest.root, latest.version)?;
        }
        Ok(CommitGuard {
            tree: self,
            _lock: lock,
        })
    }
}

fn read_at(root: &Resource, address: &Address, recursive: bool) -> Result<Resource, TreeError> {
    root.navigate(address)
        .map(|r| if recursive { r.clone() } else { r.shallow() })
        .ok_or_else(|| TreeError::NoSuchResource {
            address: address.clone(),
        })
}

/// Exclusive right to publish, held between prepare and publish
#[derive(Debug)]
pub struct CommitGuard<'a> {
    tree: &'a ResourceTree,
    _lock: MutexGuard<'a, ()>,
}

impl CommitGuard<'_> {
    /// Publish the transaction's working root and release the commit lock
    ///
    /// A transaction without writes leaves the committed root and version
    /// untouched.
    ///
    /// # Errors
    /// [`TreeError::TransactionClosed`] if `tx` already finished.
    pub fn publish(self, tx: &mut TreeTransaction) -> Result<u64, TreeError> {
        tx.ensure_active()?;
        let mut committed = self.tree.committed.write();
        if !tx.writes.is_empty() {
            committed.root = tx.working.clone();
            committed.version += 1;
        }
        tx.state = TransactionState::Committed;
        tx.undo.clear();
        info!(
            transaction = %tx.id,
            version = committed.version,
            writes = tx.writes.len(),
            "tree committed"
        );
        Ok(committed.version)
    }
}

/// Lifecycle of a [`TreeTransaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Accepting reads and writes
    Active,
    /// Published
    Committed,
    /// Undone
    RolledBack,
}

/// Private working copy of the tree for one request
#[derive(Debug, Clone)]
pub struct TreeTransaction {
    id: TransactionId,
    base_version: u64,
    working: Resource,
    writes: Vec<WriteOp>,
    undo: Vec<UndoEntry>,
    state: TransactionState,
}

impl TreeTransaction {
    /// Transaction id
    #[inline]
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Committed version the working copy is based on
    #[inline]
    #[must_use]
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Recorded writes, in order
    #[inline]
    #[must_use]
    pub fn writes(&self) -> &[WriteOp] {
        &self.writes
    }

    /// Working root including this transaction's writes
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Resource {
        &self.working
    }

    /// Read a resource, seeing this transaction's own writes
    ///
    /// Non-recursive reads return the resource with placeholder children.
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if nothing exists at `address`.
    pub fn read(&self, address: &Address, recursive: bool) -> Result<Resource, TreeError> {
        read_at(&self.working, address, recursive)
    }

    /// Check if a resource exists
    #[must_use]
    pub fn exists(&self, address: &Address) -> bool {
        self.working.navigate(address).is_some()
    }

    /// Child names of a collection
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if `address` is missing. An absent
    /// collection yields an empty set.
    pub fn children_names(
        &self,
        address: &Address,
        collection: &str,
    ) -> Result<BTreeSet<String>, TreeError> {
        self.working
            .navigate(address)
            .map(|r| r.children_names(collection))
            .ok_or_else(|| TreeError::NoSuchResource {
                address: address.clone(),
            })
    }

    /// Add a child resource
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if the parent is missing,
    /// [`TreeError::DuplicateName`] if the name is taken in `collection`.
    pub fn add_child(
        &mut self,
        parent: &Address,
        collection: &str,
        name: &str,
        model: AttributeMap,
    ) -> Result<(), TreeError> {
        self.record(WriteOp::AddChild {
            parent: parent.clone(),
            collection: collection.to_string(),
            name: name.to_string(),
            model,
        })
        .map(|_| ())
    }

    /// Remove a child resource and its subtree
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if the child is missing.
    pub fn remove_child(
        &mut self,
        parent: &Address,
        collection: &str,
        name: &str,
    ) -> Result<Resource, TreeError> {
        self.record(WriteOp::RemoveChild {
            parent: parent.clone(),
            collection: collection.to_string(),
            name: name.to_string(),
        })
        .map(|entry| entry.prior.unwrap_or_default())
    }

    /// Replace the attributes of a resource
    ///
    /// Only attributes that differ from the working copy are recorded, one
    /// [`WriteOp::WriteAttribute`] each.
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if nothing exists at `address`.
    pub fn write_model(&mut self, address: &Address, model: AttributeMap) -> Result<(), TreeError> {
        self.ensure_active()?;
        let current = self
            .working
            .navigate(address)
            .map(|node| node.model().clone())
            .ok_or_else(|| TreeError::NoSuchResource {
                address: address.clone(),
            })?;
        let unset = current
            .keys()
            .filter(|name| !model.contains_key(*name))
            .map(|name| (name.clone(), None));
        let set = model
            .iter()
            .filter(|(name, value)| current.get(*name) != Some(*value))
            .map(|(name, value)| (name.clone(), Some(value.clone())));
        let changes: Vec<_> = unset.chain(set).collect();
        for (name, value) in changes {
            self.write_attribute(address, &name, value)?;
        }
        Ok(())
    }

    /// Set or, with `None`, unset a single attribute
    ///
    /// # Errors
    /// [`TreeError::NoSuchResource`] if nothing exists at `address`.
    pub fn write_attribute(
        &mut self,
        address: &Address,
        name: &str,
        value: Option<ModelValue>,
    ) -> Result<(), TreeError> {
        self.record(WriteOp::WriteAttribute {
            address: address.clone(),
            name: name.to_string(),
            value,
        })
        .map(|_| ())
    }

    /// Undo every write in reverse order
    ///
    /// Idempotent; a no-op once committed.
    pub fn rollback(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        let undone = self.undo.len();
        while let Some(entry) = self.undo.pop() {
            restore(&mut self.working, entry);
        }
        self.writes.clear();
        self.state = TransactionState::RolledBack;
        debug!(transaction = %self.id, undone, "tree transaction rolled back");
    }

    fn ensure_active(&self) -> Result<(), TreeError> {
        if self.state == TransactionState::Active {
            Ok(())
        } else {
            Err(TreeError::TransactionClosed(self.id))
        }
    }

    fn record(&mut self, op: WriteOp) -> Result<UndoEntry, TreeError> {
        self.ensure_active()?;
        let entry = apply(&mut self.working, &op)?;
        self.undo.push(entry.clone());
        self.writes.push(op);
        Ok(entry)
    }

    fn rebase(&mut self, root: Resource, version: u64) -> Result<(), TreeError> {
        let mut working = root;
        let undo = self
            .writes
            .iter()
            .map(|op| apply(&mut working, op))
            .collect::<Result<Vec<_>, _>>()?;
        self.working = working;
        self.undo = undo;
        self.base_version = version;
        Ok(())
    }
}
