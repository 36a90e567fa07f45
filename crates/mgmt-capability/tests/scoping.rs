use mgmt_capability::{
    CapabilityError, CapabilityRegistration, CapabilityRegistry, CapabilityScope,
    RuntimeCapability,
};
use mgmt_model::Address;
use proptest::prelude::*;

const OUTBOUND: RuntimeCapability = RuntimeCapability::dynamic(
    "org.wildfly.network.outbound-socket-binding",
    "OutboundSocketBinding",
);

fn registration(host: &str, name: &str) -> CapabilityRegistration {
    let registrant = Address::root()
        .append("host", host)
        .append("socket-binding-group", "sbg")
        .append("remote-destination-outbound-socket-binding", name);
    CapabilityRegistration::new(
        OUTBOUND,
        Some(name.to_string()),
        CapabilityScope::for_address(&registrant, false),
        registrant,
    )
}

proptest! {
    #[test]
    fn prop_host_registrations_visible_only_on_that_host(
        owner in "[a-z]{1,6}",
        reader in "[a-z]{1,6}",
        name in "[a-z-]{1,10}",
    ) {
        let registry = CapabilityRegistry::new();
        registry.register(registration(&owner, &name)).unwrap();

        let from = Address::root().append("host", reader.as_str()).append("subsystem", "mail");
        let resolved = registry.resolve_capability_service_name(
            OUTBOUND.name(),
            Some(&name),
            "OutboundSocketBinding",
            &from,
        );

        if owner == reader {
            prop_assert_eq!(resolved.unwrap(), OUTBOUND.service_name(Some(&name)));
        } else {
            let not_found = matches!(resolved, Err(CapabilityError::NotFound { .. }));
            prop_assert!(not_found);
            // a disjoint scope may register the same name
            prop_assert!(registry.register(registration(&reader, &name)).is_ok());
        }
    }
}
