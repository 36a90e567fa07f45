use mgmt_controller::net::{
    LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING, REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING,
    SOCKET_BINDING,
};
use mgmt_model::{Address, OperationRequest};
use mgmt_test_utils::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

const COLLECTIONS: [&str; 3] = [
    SOCKET_BINDING,
    REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING,
    LOCAL_DESTINATION_OUTBOUND_SOCKET_BINDING,
];

#[derive(Debug, Clone)]
enum Change {
    Add { kind: usize, name: String },
    Remove { kind: usize, name: String },
}

fn change() -> impl Strategy<Value = Change> {
    prop_oneof![
        3 => (0..3usize, "[a-c]").prop_map(|(kind, name)| Change::Add { kind, name }),
        1 => (0..3usize, "[a-c]").prop_map(|(kind, name)| Change::Remove { kind, name }),
    ]
}

fn request(group: &Address, change: &Change) -> OperationRequest {
    match change {
        Change::Add { kind: 0, name } => add_socket_binding(group, name, 8000),
        Change::Add { kind: 1, name } => add_remote_outbound(group, name, "localhost", 25),
        // "anchor" is never generated, so local bindings always resolve
        Change::Add { name, .. } => add_local_outbound(group, name, "anchor"),
        Change::Remove { kind, name } => remove(group.append(COLLECTIONS[*kind], name)),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_binding_names_stay_unique_across_collections(
        changes in prop::collection::vec(change(), 1..24),
    ) {
        let (controller, container) = standalone();
        let group = seed_standard(&controller, &Address::root());
        controller.execute(add_socket_binding(&group, "anchor", 7000)).unwrap();

        for change in &changes {
            let _ = controller.execute(request(&group, change));
        }

        let model = controller.dump_model();
        let standard = &model["socket-binding-group"]["standard"];
        let mut seen = BTreeSet::new();
        for collection in COLLECTIONS {
            let Some(members) = standard.get(collection).and_then(|m| m.as_object()) else {
                continue;
            };
            for name in members.keys() {
                prop_assert!(seen.insert(name.clone()), "'{}' held twice", name);
                let capability = if collection == SOCKET_BINDING {
                    "org.wildfly.network.socket-binding"
                } else {
                    "org.wildfly.network.outbound-socket-binding"
                };
                let installed = service(&format!("{capability}.{name}"));
                prop_assert!(container.get(&installed).is_some(), "{} not installed", installed);
            }
        }
        prop_assert_eq!(container.len(), seen.len() + 2);
    }
}
