//! Capability registry
//!
//! Provides [`CapabilityRegistry`], the committed set of registrations, and
//! [`CapabilityChanges`], the registrations staged by one transaction. Staged
//! changes are visible to the transaction's own resolutions and applied to
//! the registry atomically at commit.

use crate::capability::{qualified_name, CapabilityRegistration};
use crate::error::CapabilityError;
use mgmt_model::Address;
use mgmt_service::ServiceName;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Staged registry mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityChange {
    /// Add a registration
    Register(CapabilityRegistration),
    /// Drop the registration of `name` made by `registrant`
    Remove { name: String, registrant: Address },
}

type Registrations = BTreeMap<String, Vec<CapabilityRegistration>>;

fn check_register(
    existing: &[CapabilityRegistration],
    registration: &CapabilityRegistration,
) -> Result<(), CapabilityError> {
    match existing
        .iter()
        .find(|e| e.scope().conflicts_with(registration.scope()))
    {
        Some(clash) => Err(CapabilityError::AlreadyRegistered {
            name: registration.qualified_name(),
            registrant: clash.registrant().clone(),
        }),
        None => Ok(()),
    }
}

fn pick<'a>(
    candidates: impl IntoIterator<Item = &'a CapabilityRegistration>,
    name: &str,
    expected_type: &str,
    from: &Address,
) -> Result<ServiceName, CapabilityError> {
    let registration = candidates
        .into_iter()
        .filter(|r| r.scope().is_visible_from(from))
        .max_by_key(|r| r.scope().specificity())
        .ok_or_else(|| CapabilityError::NotFound {
            name: name.to_string(),
            from: from.clone(),
        })?;
    let actual = registration.capability().value_type();
    if actual != expected_type {
        return Err(CapabilityError::TypeMismatch {
            name: name.to_string(),
            expected: expected_type.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(registration.service_name())
}

fn apply_change(map: &mut Registrations, change: &CapabilityChange) -> Result<(), CapabilityError> {
    match change {
        CapabilityChange::Register(registration) => {
            let name = registration.qualified_name();
            if let Some(existing) = map.get(&name) {
                check_register(existing, registration)?;
            }
            map.entry(name).or_default().push(registration.clone());
        }
        CapabilityChange::Remove { name, registrant } => {
            if let Some(entry) = map.get_mut(name) {
                entry.retain(|r| r.registrant() != registrant);
                if entry.is_empty() {
                    map.remove(name);
                }
            }
        }
    }
    Ok(())
}

/// Committed capability registrations
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    inner: RwLock<Registrations>,
}

impl CapabilityRegistry {
    /// Empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct registered names
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Registrations of a fully qualified name
    #[must_use]
    pub fn registrations(&self, qualified: &str) -> Vec<CapabilityRegistration> {
        self.inner.read().get(qualified).cloned().unwrap_or_default()
    }

    /// Register directly, outside any transaction
    ///
    /// # Errors
    /// [`CapabilityError::AlreadyRegistered`] on a conflicting registration.
    pub fn register(&self, registration: CapabilityRegistration) -> Result<(), CapabilityError> {
        let name = registration.qualified_name();
        apply_change(
            &mut self.inner.write(),
            &CapabilityChange::Register(registration),
        )?;
        info!(capability = %name, "capability registered");
        Ok(())
    }

    /// Drop the registration of `name` made by `registrant`
    pub fn remove(&self, name: &str, registrant: &Address) {
        // removal of an absent registration is a no-op
        let _ = apply_change(
            &mut self.inner.write(),
            &CapabilityChange::Remove {
                name: name.to_string(),
                registrant: registrant.clone(),
            },
        );
    }

    /// Resolve a capability to the service name providing it
    ///
    /// # Errors
    /// [`CapabilityError::NotFound`] if no registration is visible from
    /// `from`, [`CapabilityError::TypeMismatch`] if it provides another type.
    pub fn resolve_capability_service_name(
        &self,
        name: &str,
        dynamic: Option<&str>,
        expected_type: &str,
        from: &Address,
    ) -> Result<ServiceName, CapabilityError> {
        let qualified = qualified_name(name, dynamic);
        let map = self.inner.read();
        pick(map.get(&qualified).into_iter().flatten(), &qualified, expected_type, from)
    }

    /// Apply staged changes atomically
    ///
    /// # Errors
    /// [`CapabilityError::AlreadyRegistered`] if a staged registration clashes
    /// with the registry; nothing is applied in that case.
    pub fn apply(&self, changes: &CapabilityChanges) -> Result<(), CapabilityError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut map = self.inner.write();
        let mut next = map.clone();
        for change in &changes.changes {
            apply_change(&mut next, change)?;
        }
        *map = next;
        debug!(changes = changes.len(), "capability changes applied");
        Ok(())
    }

    /// JSON dump of all registrations
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let map = self.inner.read();
        serde_json::Value::Object(
            map.iter()
                .map(|(name, registrations)| {
                    let entries = registrations
                        .iter()
                        .map(|r| {
                            serde_json::json!({
                                "scope": r.scope().to_string(),
                                "registrant": r.registrant().to_string(),
                                "service": r.service_name().to_string(),
                            })
                        })
                        .collect();
                    (name.clone(), serde_json::Value::Array(entries))
                })
                .collect(),
        )
    }
}

/// Capability changes staged by one transaction
#[derive(Debug, Clone, Default)]
pub struct CapabilityChanges {
    changes: Vec<CapabilityChange>,
}

impl CapabilityChanges {
    /// No changes
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Staged changes, in order
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &[CapabilityChange] {
        &self.changes
    }

    /// Discard everything staged
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    fn view(&self, registry: &CapabilityRegistry, qualified: &str) -> Vec<CapabilityRegistration> {
        let mut view = registry.registrations(qualified);
        for change in &self.changes {
            match change {
                CapabilityChange::Register(r) if r.qualified_name() == qualified => {
                    view.push(r.clone());
                }
                CapabilityChange::Remove { name, registrant } if name == qualified => {
                    view.retain(|r| r.registrant() != registrant);
                }
                _ => {}
            }
        }
        view
    }

    /// Stage a registration
    ///
    /// # Errors
    /// [`CapabilityError::AlreadyRegistered`] if it clashes with the registry
    /// as seen by this transaction.
    pub fn register(
        &mut self,
        registry: &CapabilityRegistry,
        registration: CapabilityRegistration,
    ) -> Result<(), CapabilityError> {
        check_register(
            &self.view(registry, &registration.qualified_name()),
            &registration,
        )?;
        self.changes.push(CapabilityChange::Register(registration));
        Ok(())
    }

    /// Stage removal of the registration of `name` made by `registrant`
    pub fn remove(&mut self, name: impl Into<String>, registrant: &Address) {
        self.changes.push(CapabilityChange::Remove {
            name: name.into(),
            registrant: registrant.clone(),
        });
    }

    /// Resolve against the registry plus staged changes
    ///
    /// # Errors
    /// As [`CapabilityRegistry::resolve_capability_service_name`].
    pub fn resolve_capability_service_name(
        &self,
        registry: &CapabilityRegistry,
        name: &str,
        dynamic: Option<&str>,
        expected_type: &str,
        from: &Address,
    ) -> Result<ServiceName, CapabilityError> {
        let qualified = qualified_name(name, dynamic);
        pick(&self.view(registry, &qualified), &qualified, expected_type, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityScope, RuntimeCapability};
    use pretty_assertions::assert_eq;

    const MANAGER: RuntimeCapability = RuntimeCapability::new(
        "org.wildfly.management.socket-binding-manager",
        "SocketBindingManager",
    );
    const INTERFACE: RuntimeCapability =
        RuntimeCapability::dynamic("org.wildfly.network.interface", "NetworkInterfaceBinding");

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn interface(host: &str, name: &str) -> CapabilityRegistration {
        let registrant = addr(&format!("/host={host}/interface={name}"));
        CapabilityRegistration::new(
            INTERFACE,
            Some(name.to_string()),
            CapabilityScope::for_address(&registrant, false),
            registrant,
        )
    }

    #[test]
    fn resolves_global_capability() {
        let registry = CapabilityRegistry::new();
        registry
            .register(CapabilityRegistration::new(
                MANAGER,
                None,
                CapabilityScope::Global,
                Address::root(),
            ))
            .unwrap();
        let name = registry
            .resolve_capability_service_name(
                MANAGER.name(),
                None,
                "SocketBindingManager",
                &addr("/host=master/socket-binding-group=sbg"),
            )
            .unwrap();
        assert_eq!(name.to_string(), "org.wildfly.management.socket-binding-manager");
    }

    #[test]
    fn scoped_registration_invisible_elsewhere() {
        let registry = CapabilityRegistry::new();
        registry.register(interface("master", "public")).unwrap();
        registry.register(interface("slave", "public")).unwrap();

        assert!(registry
            .resolve_capability_service_name(
                INTERFACE.name(),
                Some("public"),
                "NetworkInterfaceBinding",
                &addr("/host=master/socket-binding-group=sbg"),
            )
            .is_ok());
        assert!(matches!(
            registry.resolve_capability_service_name(
                INTERFACE.name(),
                Some("public"),
                "NetworkInterfaceBinding",
                &addr("/profile=default"),
            ),
            Err(CapabilityError::NotFound { .. })
        ));
        assert!(matches!(
            registry.register(interface("master", "public")),
            Err(CapabilityError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn host_registration_shadows_global() {
        let registry = CapabilityRegistry::new();
        let global = addr("/interface=public");
        registry
            .register(CapabilityRegistration::new(
                INTERFACE,
                Some("public".into()),
                CapabilityScope::for_address(&global, false),
                global,
            ))
            .unwrap();
        registry.register(interface("master", "public")).unwrap();

        let resolve = |from: &str| {
            registry.resolve_capability_service_name(
                INTERFACE.name(),
                Some("public"),
                "NetworkInterfaceBinding",
                &addr(from),
            )
        };
        assert!(resolve("/host=master/socket-binding-group=sbg").is_ok());
        assert!(resolve("/socket-binding-group=standard").is_ok());
        assert_eq!(registry.registrations("org.wildfly.network.interface.public").len(), 2);
    }

    #[test]
    fn type_mismatch() {
        let registry = CapabilityRegistry::new();
        registry.register(interface("master", "public")).unwrap();
        assert!(matches!(
            registry.resolve_capability_service_name(
                INTERFACE.name(),
                Some("public"),
                "SocketBinding",
                &addr("/host=master"),
            ),
            Err(CapabilityError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn staged_changes_visible_before_apply() {
        let registry = CapabilityRegistry::new();
        let mut staged = CapabilityChanges::new();
        staged.register(&registry, interface("master", "public")).unwrap();

        let from = addr("/host=master");
        assert!(staged
            .resolve_capability_service_name(&registry, INTERFACE.name(), Some("public"), "NetworkInterfaceBinding", &from)
            .is_ok());
        assert!(registry
            .resolve_capability_service_name(INTERFACE.name(), Some("public"), "NetworkInterfaceBinding", &from)
            .is_err());

        registry.apply(&staged).unwrap();
        assert!(registry
            .resolve_capability_service_name(INTERFACE.name(), Some("public"), "NetworkInterfaceBinding", &from)
            .is_ok());
    }

    #[test]
    fn staged_removal_hides_registration_and_apply_is_atomic() {
        let registry = CapabilityRegistry::new();
        registry.register(interface("master", "public")).unwrap();

        let mut staged = CapabilityChanges::new();
        staged.remove(INTERFACE.qualified_name(Some("public")), &addr("/host=master/interface=public"));
        assert!(staged
            .resolve_capability_service_name(&registry, INTERFACE.name(), Some("public"), "NetworkInterfaceBinding", &addr("/host=master"))
            .is_err());

        let mut clashing = CapabilityChanges::new();
        clashing.remove(INTERFACE.qualified_name(Some("public")), &addr("/host=master/interface=public"));
        clashing.changes.push(CapabilityChange::Register(interface("slave", "x")));
        clashing.changes.push(CapabilityChange::Register(interface("slave", "x")));
        assert!(registry.apply(&clashing).is_err());
        assert_eq!(registry.registrations("org.wildfly.network.interface.public").len(), 1);
        assert!(registry.registrations("org.wildfly.network.interface.x").is_empty());
    }
}
