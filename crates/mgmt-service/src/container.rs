//! Service container
//!
//! [`ServiceContainer`] is the scheduler seam: runtime steps register nodes
//! synchronously and rely on removal as compensation. The in-memory
//! implementation keeps nodes and aliases and can report a start order.

use crate::error::ServiceError;
use crate::name::ServiceName;
use crate::node::ServiceNode;
use parking_lot::RwLock;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Scheduler accepting service registrations
pub trait ServiceContainer: Send + Sync {
    /// Register a node under its name and aliases
    ///
    /// # Errors
    /// [`ServiceError::Duplicate`] if any of its names is taken.
    fn register(&self, node: ServiceNode) -> Result<(), ServiceError>;

    /// Remove a node by primary name or alias, returning it
    ///
    /// # Errors
    /// [`ServiceError::Unknown`] if nothing is registered under `name`.
    fn remove(&self, name: &ServiceName) -> Result<ServiceNode, ServiceError>;

    /// Check if a name or alias is registered
    fn contains(&self, name: &ServiceName) -> bool;
}

#[derive(Debug, Default)]
struct Registry {
    nodes: BTreeMap<ServiceName, ServiceNode>,
    aliases: BTreeMap<ServiceName, ServiceName>,
}

impl Registry {
    fn canonical<'a>(&'a self, name: &'a ServiceName) -> Option<&'a ServiceName> {
        if self.nodes.contains_key(name) {
            Some(name)
        } else {
            self.aliases.get(name)
        }
    }
}

/// Thread-safe in-memory [`ServiceContainer`]
#[derive(Debug, Default)]
pub struct InMemoryServiceContainer {
    inner: RwLock<Registry>,
}

impl InMemoryServiceContainer {
    /// Empty container
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    /// Node registered under a name or alias
    #[must_use]
    pub fn get(&self, name: &ServiceName) -> Option<ServiceNode> {
        let registry = self.inner.read();
        registry
            .canonical(name)
            .and_then(|canonical| registry.nodes.get(canonical))
            .cloned()
    }

    /// Primary names of registered nodes
    #[must_use]
    pub fn names(&self) -> Vec<ServiceName> {
        self.inner.read().nodes.keys().cloned().collect()
    }

    /// Dependencies that resolve to no registered service, per dependent
    #[must_use]
    pub fn missing_dependencies(&self) -> BTreeMap<ServiceName, Vec<ServiceName>> {
        let registry = self.inner.read();
        registry
            .nodes
            .values()
            .filter_map(|node| {
                let missing: Vec<_> = node
                    .dependencies()
                    .iter()
                    .filter(|d| registry.canonical(&d.name).is_none())
                    .map(|d| d.name.clone())
                    .collect();
                (!missing.is_empty()).then(|| (node.name().clone(), missing))
            })
            .collect()
    }

    /// Registered services ordered so each follows its dependencies
    ///
    /// Dependencies on unregistered services are ignored.
    ///
    /// # Errors
    /// [`ServiceError::DependencyCycle`] naming a service on a cycle.
    pub fn start_order(&self) -> Result<Vec<ServiceName>, ServiceError> {
        let registry = self.inner.read();
        let names: Vec<&ServiceName> = registry.nodes.keys().collect();
        let index: BTreeMap<&ServiceName, usize> =
            names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut graph = DiGraphMap::<usize, ()>::new();
        for (i, node) in registry.nodes.values().enumerate() {
            graph.add_node(i);
            for dependency in node.dependencies() {
                if let Some(dep) = registry
                    .canonical(&dependency.name)
                    .and_then(|c| index.get(c))
                {
                    graph.add_edge(*dep, i, ());
                }
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(|i| names[i].clone()).collect())
            .map_err(|cycle| ServiceError::DependencyCycle {
                name: names[cycle.node_id()].clone(),
            })
    }

    /// JSON dump of all registered nodes
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let registry = self.inner.read();
        serde_json::Value::Array(registry.nodes.values().map(ServiceNode::describe).collect())
    }
}

impl ServiceContainer for InMemoryServiceContainer {
    fn register(&self, node: ServiceNode) -> Result<(), ServiceError> {
        let mut registry = self.inner.write();
        if let Some(taken) = node
            .all_names()
            .find(|n| registry.canonical(n).is_some())
        {
            return Err(ServiceError::Duplicate {
                name: taken.clone(),
            });
        }
        for alias in node.aliases() {
            registry.aliases.insert(alias.clone(), node.name().clone());
        }
        info!(
            service = %node.name(),
            mode = ?node.initial_mode(),
            dependencies = node.dependencies().len(),
            "service installed"
        );
        registry.nodes.insert(node.name().clone(), node);
        Ok(())
    }

    fn remove(&self, name: &ServiceName) -> Result<ServiceNode, ServiceError> {
        let mut registry = self.inner.write();
        let canonical = registry
            .canonical(name)
            .cloned()
            .ok_or_else(|| ServiceError::Unknown { name: name.clone() })?;
        let node = registry
            .nodes
            .remove(&canonical)
            .ok_or_else(|| ServiceError::Unknown { name: name.clone() })?;
        for alias in node.aliases() {
            registry.aliases.remove(alias);
        }
        debug!(service = %canonical, "service removed");
        Ok(node)
    }

    fn contains(&self, name: &ServiceName) -> bool {
        self.inner.read().canonical(name).is_some()
    }
}
