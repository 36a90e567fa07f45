//! Service nodes
//!
//! A [`ServiceNode`] is what a runtime step hands to the scheduler: the
//! service value, its identity, its dependency edges and its start mode.

use crate::name::ServiceName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Value provided by a service
pub trait Service: fmt::Debug + Send + Sync {
    /// Type name of the provided value, used to check injections
    fn value_type(&self) -> &'static str;

    /// Configuration of the service as JSON
    fn describe(&self) -> serde_json::Value;
}

/// When the scheduler starts a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceMode {
    /// Started when a dependent needs it
    #[default]
    OnDemand,
    /// Started as soon as possible
    Active,
    /// Started when its dependencies are available
    Passive,
}

/// Field of the dependent service receiving the dependency's value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InjectionTarget(pub String);

impl InjectionTarget {
    /// Target named `field`
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }
}

impl fmt::Display for InjectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dependency edge of a [`ServiceNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Service depended upon
    pub name: ServiceName,
    /// Expected value type
    pub value_type: String,
    /// Where the value is injected
    pub target: InjectionTarget,
}

/// Service submitted to the scheduler
#[derive(Debug, Clone)]
pub struct ServiceNode {
    name: ServiceName,
    service: Arc<dyn Service>,
    dependencies: Vec<Dependency>,
    initial_mode: ServiceMode,
    aliases: Vec<ServiceName>,
}

impl ServiceNode {
    /// Start building a node
    #[must_use]
    pub fn builder(name: ServiceName, service: Arc<dyn Service>) -> ServiceBuilder {
        ServiceBuilder {
            node: ServiceNode {
                name,
                service,
                dependencies: Vec::new(),
                initial_mode: ServiceMode::default(),
                aliases: Vec::new(),
            },
        }
    }

    /// Primary name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Provided value
    #[inline]
    #[must_use]
    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    /// Dependency edges
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Initial mode
    #[inline]
    #[must_use]
    pub fn initial_mode(&self) -> ServiceMode {
        self.initial_mode
    }

    /// Alternative names
    #[inline]
    #[must_use]
    pub fn aliases(&self) -> &[ServiceName] {
        &self.aliases
    }

    /// Primary name followed by aliases
    pub fn all_names(&self) -> impl Iterator<Item = &ServiceName> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }

    /// JSON description of the node
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "value-type": self.service.value_type(),
            "mode": self.initial_mode,
            "aliases": self.aliases,
            "dependencies": self.dependencies,
            "config": self.service.describe(),
        })
    }
}

/// Builder for [`ServiceNode`]
#[derive(Debug)]
pub struct ServiceBuilder {
    node: ServiceNode,
}

impl ServiceBuilder {
    /// Add a dependency injected into `target`
    #[must_use]
    pub fn add_dependency(
        mut self,
        name: ServiceName,
        value_type: impl Into<String>,
        target: InjectionTarget,
    ) -> Self {
        self.node.dependencies.push(Dependency {
            name,
            value_type: value_type.into(),
            target,
        });
        self
    }

    /// Set the initial mode
    #[must_use]
    pub fn initial_mode(mut self, mode: ServiceMode) -> Self {
        self.node.initial_mode = mode;
        self
    }

    /// Add an alternative name
    #[must_use]
    pub fn add_alias(mut self, alias: ServiceName) -> Self {
        self.node.aliases.push(alias);
        self
    }

    /// Finish the node
    #[must_use]
    pub fn build(self) -> ServiceNode {
        self.node
    }
}
