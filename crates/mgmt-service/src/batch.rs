//! Per-operation dependency graph builder
//!
//! The services submitted by one operation must not depend on each other in
//! a cycle. [`ServiceBatch`] tracks the edges contributed so far and rejects
//! the node that would close a cycle, leaving the graph as it was.

use crate::error::ServiceError;
use crate::name::ServiceName;
use crate::node::ServiceNode;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet};

/// Dependency graph of the services submitted by one operation
#[derive(Debug, Default)]
pub struct ServiceBatch {
    ids: BTreeMap<ServiceName, usize>,
    graph: DiGraphMap<usize, ()>,
    installed: BTreeSet<ServiceName>,
    order: Vec<ServiceName>,
}

impl ServiceBatch {
    /// Empty batch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if no node was accepted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Primary names of accepted nodes, in submission order
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[ServiceName] {
        &self.order
    }

    fn id(&mut self, name: &ServiceName) -> usize {
        let next = self.ids.len();
        let id = *self.ids.entry(name.clone()).or_insert(next);
        self.graph.add_node(id);
        id
    }

    /// Accept a node into the batch
    ///
    /// # Errors
    /// [`ServiceError::Duplicate`] if a name or alias was already submitted,
    /// [`ServiceError::DependencyCycle`] if the node closes a cycle.
    pub fn add(&mut self, node: &ServiceNode) -> Result<(), ServiceError> {
        if let Some(taken) = node.all_names().find(|n| self.installed.contains(*n)) {
            return Err(ServiceError::Duplicate {
                name: taken.clone(),
            });
        }

        let id = self.id(node.name());
        let mut added = Vec::new();
        for alias in node.aliases() {
            let alias_id = self.id(alias);
            added.push((alias_id, id));
        }
        for dependency in node.dependencies() {
            let dep_id = self.id(&dependency.name);
            added.push((id, dep_id));
        }

        let mut fresh = Vec::new();
        let mut cyclic = false;
        for (from, to) in added {
            if from == to {
                cyclic = true;
                break;
            }
            if self.graph.add_edge(from, to, ()).is_none() {
                fresh.push((from, to));
            }
        }

        if cyclic || is_cyclic_directed(&self.graph) {
            for (from, to) in fresh {
                self.graph.remove_edge(from, to);
            }
            return Err(ServiceError::DependencyCycle {
                name: node.name().clone(),
            });
        }

        self.installed.extend(node.all_names().cloned());
        self.order.push(node.name().clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{InjectionTarget, Service};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Noop;

    impl Service for Noop {
        fn value_type(&self) -> &'static str {
            "Noop"
        }

        fn describe(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    fn node(name: &str, deps: &[&str]) -> ServiceNode {
        deps.iter()
            .fold(
                ServiceNode::builder(ServiceName::parse(name), Arc::new(Noop)),
                |b, d| b.add_dependency(ServiceName::parse(d), "Noop", InjectionTarget::new(*d)),
            )
            .build()
    }

    #[test]
    fn rejects_self_dependency() {
        let mut batch = ServiceBatch::new();
        assert!(matches!(
            batch.add(&node("a", &["a"])),
            Err(ServiceError::DependencyCycle { .. })
        ));
        assert!(batch.is_empty());
    }

    #[test]
    fn rejects_cycle_and_keeps_graph() {
        let mut batch = ServiceBatch::new();
        batch.add(&node("a", &["b"])).unwrap();
        batch.add(&node("b", &["c"])).unwrap();
        assert!(matches!(
            batch.add(&node("c", &["a"])),
            Err(ServiceError::DependencyCycle { .. })
        ));
        batch.add(&node("c", &["external"])).unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn cycle_through_alias_detected() {
        let mut batch = ServiceBatch::new();
        batch.add(&node("a", &["alias.of.b"])).unwrap();
        let b = ServiceNode::builder(ServiceName::parse("b"), Arc::new(Noop))
            .add_alias(ServiceName::parse("alias.of.b"))
            .add_dependency(ServiceName::parse("a"), "Noop", InjectionTarget::new("a"))
            .build();
        assert!(matches!(
            batch.add(&b),
            Err(ServiceError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn rejects_duplicate() {
        let mut batch = ServiceBatch::new();
        batch.add(&node("a", &[])).unwrap();
        assert!(matches!(
            batch.add(&node("a", &[])),
            Err(ServiceError::Duplicate { .. })
        ));
    }
}
