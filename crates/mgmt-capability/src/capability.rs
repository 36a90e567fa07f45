//! Capabilities and registrations

use mgmt_model::Address;
use mgmt_service::ServiceName;
use std::fmt;

/// Named contract a resource provides to the rest of the model
///
/// A dynamic capability is registered once per resource, with the resource
/// name as its dynamic part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCapability {
    name: &'static str,
    value_type: &'static str,
    dynamic: bool,
}

impl RuntimeCapability {
    /// Capability registered once, without a dynamic part
    #[must_use]
    pub const fn new(name: &'static str, value_type: &'static str) -> Self {
        Self {
            name,
            value_type,
            dynamic: false,
        }
    }

    /// Capability registered per resource
    #[must_use]
    pub const fn dynamic(name: &'static str, value_type: &'static str) -> Self {
        Self {
            name,
            value_type,
            dynamic: true,
        }
    }

    /// Base name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type of the value the capability's service provides
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Check if the capability takes a dynamic part
    #[inline]
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Full name with an optional dynamic part
    #[must_use]
    pub fn qualified_name(&self, dynamic: Option<&str>) -> String {
        qualified_name(self.name, dynamic)
    }

    /// Service name the capability resolves to
    #[must_use]
    pub fn service_name(&self, dynamic: Option<&str>) -> ServiceName {
        service_name(self.name, dynamic)
    }
}

pub(crate) fn qualified_name(name: &str, dynamic: Option<&str>) -> String {
    match dynamic {
        Some(part) => format!("{name}.{part}"),
        None => name.to_string(),
    }
}

pub(crate) fn service_name(name: &str, dynamic: Option<&str>) -> ServiceName {
    let base = ServiceName::parse(name);
    match dynamic {
        Some(part) => base.append(part),
        None => base,
    }
}

/// Part of the model in which a registration is visible
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityScope {
    /// Visible everywhere
    Global,
    /// Visible from addresses under the given prefix
    Subtree(Address),
}

impl CapabilityScope {
    /// Scope of a capability registered by the resource at `address`
    ///
    /// On a server everything is global. Elsewhere the first address segment
    /// (a host, a profile, a socket binding group) bounds visibility, and
    /// registrations by root-level resources are global.
    #[must_use]
    pub fn for_address(address: &Address, server: bool) -> Self {
        if server || address.len() < 2 {
            Self::Global
        } else {
            Self::Subtree(address.sub_address(1))
        }
    }

    /// Check if the scope contains `from`
    #[must_use]
    pub fn is_visible_from(&self, from: &Address) -> bool {
        match self {
            Self::Global => true,
            Self::Subtree(prefix) => prefix.is_prefix_of(from),
        }
    }

    /// Check if two registrations of one name in these scopes clash
    ///
    /// A subtree registration may shadow a global one; two global
    /// registrations, or two nested subtrees, clash.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Global, Self::Global) => true,
            (Self::Subtree(a), Self::Subtree(b)) => a.is_prefix_of(b) || b.is_prefix_of(a),
            _ => false,
        }
    }

    /// Rank used to prefer the most specific visible registration
    #[must_use]
    pub fn specificity(&self) -> usize {
        match self {
            Self::Global => 0,
            Self::Subtree(prefix) => prefix.len() + 1,
        }
    }
}

impl fmt::Display for CapabilityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Subtree(prefix) => write!(f, "{prefix}"),
        }
    }
}

/// One registration of a capability by a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistration {
    capability: RuntimeCapability,
    dynamic: Option<String>,
    scope: CapabilityScope,
    registrant: Address,
}

impl CapabilityRegistration {
    /// Registration of `capability` by the resource at `registrant`
    #[must_use]
    pub fn new(
        capability: RuntimeCapability,
        dynamic: Option<String>,
        scope: CapabilityScope,
        registrant: Address,
    ) -> Self {
        Self {
            capability,
            dynamic,
            scope,
            registrant,
        }
    }

    /// Registered capability
    #[inline]
    #[must_use]
    pub fn capability(&self) -> &RuntimeCapability {
        &self.capability
    }

    /// Dynamic part, if any
    #[inline]
    #[must_use]
    pub fn dynamic_part(&self) -> Option<&str> {
        self.dynamic.as_deref()
    }

    /// Visibility scope
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &CapabilityScope {
        &self.scope
    }

    /// Address of the registering resource
    #[inline]
    #[must_use]
    pub fn registrant(&self) -> &Address {
        &self.registrant
    }

    /// Full capability name
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.capability.qualified_name(self.dynamic.as_deref())
    }

    /// Service name this registration resolves to
    #[must_use]
    pub fn service_name(&self) -> ServiceName {
        self.capability.service_name(self.dynamic.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTBOUND: RuntimeCapability = RuntimeCapability::dynamic(
        "org.wildfly.network.outbound-socket-binding",
        "OutboundSocketBinding",
    );

    #[test]
    fn dynamic_service_name() {
        assert_eq!(
            OUTBOUND.service_name(Some("mail-smtp")).to_string(),
            "org.wildfly.network.outbound-socket-binding.mail-smtp"
        );
        assert_eq!(
            OUTBOUND.qualified_name(Some("mail-smtp")),
            "org.wildfly.network.outbound-socket-binding.mail-smtp"
        );
    }

    #[test]
    fn scopes() {
        let host: Address = "/host=master/socket-binding-group=sbg".parse().unwrap();
        let scope = CapabilityScope::for_address(&host, false);
        assert_eq!(scope, CapabilityScope::Subtree("/host=master".parse().unwrap()));
        assert!(scope.is_visible_from(&"/host=master/interface=public".parse().unwrap()));
        assert!(!scope.is_visible_from(&"/host=other".parse().unwrap()));
        assert_eq!(CapabilityScope::for_address(&host, true), CapabilityScope::Global);

        let root: Address = "/interface=public".parse().unwrap();
        assert_eq!(CapabilityScope::for_address(&root, false), CapabilityScope::Global);

        let other = CapabilityScope::Subtree("/host=other".parse().unwrap());
        assert!(!scope.conflicts_with(&other));
        assert!(scope.conflicts_with(&scope.clone()));
        assert!(!scope.conflicts_with(&CapabilityScope::Global));
        assert!(CapabilityScope::Global.conflicts_with(&CapabilityScope::Global));
        assert!(scope.specificity() > CapabilityScope::Global.specificity());
    }
}
