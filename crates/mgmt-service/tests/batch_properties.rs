use mgmt_service::{
    InMemoryServiceContainer, InjectionTarget, Service, ServiceBatch, ServiceContainer,
    ServiceError, ServiceName, ServiceNode,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug)]
struct Unit;

impl Service for Unit {
    fn value_type(&self) -> &'static str {
        "Unit"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

fn node(i: usize, deps: &[usize]) -> ServiceNode {
    deps.iter()
        .fold(
            ServiceNode::builder(ServiceName::parse(&format!("svc.n{i}")), Arc::new(Unit)),
            |b, d| {
                b.add_dependency(
                    ServiceName::parse(&format!("svc.n{d}")),
                    "Unit",
                    InjectionTarget::new(format!("n{d}")),
                )
            },
        )
        .build()
}

proptest! {
    #[test]
    fn prop_accepted_batch_has_a_start_order(
        deps in proptest::collection::vec(proptest::collection::vec(0usize..10, 0..4), 1..10)
    ) {
        let mut batch = ServiceBatch::new();
        let container = InMemoryServiceContainer::new();

        for (i, d) in deps.iter().enumerate() {
            let node = node(i, d);
            match batch.add(&node) {
                Ok(()) => container.register(node).unwrap(),
                Err(err) => {
                    let cycle = matches!(err, ServiceError::DependencyCycle { .. });
                    prop_assert!(cycle, "unexpected {:?}", err);
                }
            }
        }

        // whatever the batch accepted is acyclic
        let order = container.start_order();
        prop_assert!(order.is_ok());
        prop_assert_eq!(order.unwrap().len(), batch.len());
    }
}
