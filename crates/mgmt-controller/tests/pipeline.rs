use mgmt_controller::net::{
    REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING, SOCKET_BINDING, SOCKET_BINDING_CAPABILITY,
};
use mgmt_controller::{
    ControllerConfig, ControllerError, ModelController, OperationContext, OperationStepHandler,
    Stage,
};
use mgmt_model::{Address, OperationRequest};
use mgmt_service::{Service, ServiceContainer, ServiceNode};
use mgmt_test_utils::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;

type Log = Arc<Mutex<Vec<&'static str>>>;

fn op<F>(handler: F) -> Arc<dyn OperationStepHandler>
where
    F: Fn(&mut OperationContext, &OperationRequest) -> Result<(), ControllerError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(handler)
}

fn record(
    log: &Log,
    label: &'static str,
) -> impl Fn(&mut OperationContext, &OperationRequest) -> Result<(), ControllerError> + Send + Sync + 'static
{
    let log = Arc::clone(log);
    move |_: &mut OperationContext, _: &OperationRequest| {
        log.lock().push(label);
        Ok(())
    }
}

#[derive(Debug)]
struct Marker;

impl Service for Marker {
    fn value_type(&self) -> &'static str {
        "Marker"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// `marker` at the root: adds `/marker=x`, installs `test.marker`, then fails verification
fn failing_marker() -> Arc<dyn OperationStepHandler> {
    op(|ctx, request| {
        ctx.add_resource(&Address::root().append("marker", "x"), BTreeMap::new())?;
        ctx.add_step_fn(
            Stage::Runtime,
            request.clone(),
            |ctx: &mut OperationContext, _: &OperationRequest| {
                ctx.install_service(ServiceNode::builder(service("test.marker"), Arc::new(Marker)).build())
            },
        )?;
        ctx.add_step_fn(
            Stage::Verify,
            request.clone(),
            |_: &mut OperationContext, _: &OperationRequest| {
                Err(ControllerError::Failed("verification rejected".into()))
            },
        )
    })
}

fn marker_request() -> OperationRequest {
    OperationRequest::new(Address::root(), "marker")
}

#[test]
fn nested_steps_run_before_queued_siblings() {
    let log: Log = Arc::default();
    let mut operations = ModelController::standard_operations();
    let l = Arc::clone(&log);
    operations.register_operation(
        &Address::root(),
        "compose",
        op(move |ctx, request| {
            l.lock().push("model");
            ctx.add_step_fn(Stage::Verify, request.clone(), record(&l, "verify"))?;
            ctx.add_step_fn(Stage::Runtime, request.clone(), record(&l, "runtime"))?;
            let nested = Arc::clone(&l);
            ctx.add_step_fn(
                Stage::Model,
                request.clone(),
                move |ctx: &mut OperationContext, request: &OperationRequest| {
                    nested.lock().push("model-1");
                    ctx.add_step_fn(Stage::Model, request.clone(), record(&nested, "model-1a"))
                },
            )?;
            ctx.add_step_fn(Stage::Model, request.clone(), record(&l, "model-2"))
        }),
    );
    let controller = ModelController::with_operations(
        &ControllerConfig::default(),
        Arc::new(mgmt_service::InMemoryServiceContainer::new()),
        operations,
    )
    .unwrap();

    controller
        .execute(OperationRequest::new(Address::root(), "compose"))
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec!["model", "model-1", "model-1a", "model-2", "runtime", "verify"]
    );
}

#[test]
fn steps_cannot_target_a_finished_stage() {
    let mut operations = ModelController::standard_operations();
    operations.register_operation(
        &Address::root(),
        "late",
        op(|ctx, request| {
            ctx.add_step_fn(
                Stage::Runtime,
                request.clone(),
                |ctx: &mut OperationContext, request: &OperationRequest| {
                    ctx.add_step_fn(
                        Stage::Model,
                        request.clone(),
                        |_: &mut OperationContext, _: &OperationRequest| Ok(()),
                    )
                },
            )
        }),
    );
    let controller = ModelController::with_operations(
        &ControllerConfig::default(),
        Arc::new(mgmt_service::InMemoryServiceContainer::new()),
        operations,
    )
    .unwrap();

    let failed = controller
        .execute(OperationRequest::new(Address::root(), "late"))
        .unwrap_err();
    assert_eq!(failed.message_key, "operationFailed");
}

#[test]
fn verify_failure_undoes_model_and_services() {
    let mut operations = ModelController::standard_operations();
    operations.register_operation(&Address::root(), "marker", failing_marker());
    let container = Arc::new(mgmt_service::InMemoryServiceContainer::new());
    let controller = ModelController::with_operations(
        &ControllerConfig::default(),
        container.clone(),
        operations,
    )
    .unwrap();

    let failed = controller.execute(marker_request()).unwrap_err();

    assert_eq!(failed.message_key, "operationFailed");
    assert!(failed.rollback_warnings.is_empty());
    assert!(!container.contains(&service("test.marker")));
    assert!(controller
        .tree()
        .read(&Address::root().append("marker", "x"), false)
        .is_err());
    assert_eq!(controller.tree().version(), 0);
}

#[test]
fn failed_compensation_is_reported_not_raised() {
    let mut operations = ModelController::standard_operations();
    operations.register_operation(&Address::root(), "marker", failing_marker());
    let container = Arc::new(FailingRemovalContainer::default());
    let controller = ModelController::with_operations(
        &ControllerConfig::default(),
        container.clone(),
        operations,
    )
    .unwrap();

    let failed = controller.execute(marker_request()).unwrap_err();

    assert_eq!(failed.message_key, "operationFailed");
    assert_eq!(failed.rollback_warnings.len(), 1);
    assert!(failed.rollback_warnings[0].contains("test.marker"));
    assert!(container.contains(&service("test.marker")));
    assert_eq!(
        failed.to_json()["rollback-warnings"].as_array().map(Vec::len),
        Some(1)
    );
}

#[test]
fn unknown_operation_is_rejected() {
    let (controller, _) = standalone();

    let failed = controller
        .execute(OperationRequest::new(Address::root().append("interface", "public"), "reload"))
        .unwrap_err();

    assert_eq!(failed.message_key, "unknownOperation");
    assert!(matches!(failed.cause, ControllerError::UnknownOperation { .. }));
}

#[test]
fn read_resource_renders_children() {
    let (controller, _) = standalone();
    let group = seed_standard(&controller, &Address::root());
    controller.execute(add_socket_binding(&group, "http", 8080)).unwrap();
    let version = controller.tree().version();

    let shallow = controller
        .execute(OperationRequest::new(group.clone(), "read-resource"))
        .unwrap();
    assert_eq!(shallow.result["default-interface"], "public");
    assert!(shallow.result[SOCKET_BINDING]["http"].is_null());

    let deep = controller
        .execute(OperationRequest::new(group, "read-resource").with_param("recursive", true))
        .unwrap();
    assert_eq!(deep.result[SOCKET_BINDING]["http"]["port"], 8080);
    assert_eq!(deep.version, version);
}

#[test]
fn write_attribute_changes_model_and_requires_reload() {
    let (controller, container) = standalone();
    let group = seed_standard(&controller, &Address::root());
    controller.execute(add_socket_binding(&group, "http", 8080)).unwrap();
    let http = group.append(SOCKET_BINDING, "http");

    let outcome = controller
        .execute(write_attribute(http.clone(), "port", 8443))
        .unwrap();

    assert!(outcome.reload_required);
    assert_eq!(
        controller.tree().read(&http, false).unwrap().attribute("port"),
        &mgmt_model::ModelValue::Int(8443)
    );
    let node = container
        .get(&SOCKET_BINDING_CAPABILITY.service_name(Some("http")))
        .unwrap();
    assert_eq!(node.service().describe()["port"], 8080);
}

#[test]
fn write_attribute_validates_name_and_value() {
    let (controller, _) = standalone();
    let group = seed_standard(&controller, &Address::root());
    controller.execute(add_socket_binding(&group, "http", 8080)).unwrap();
    let http = group.append(SOCKET_BINDING, "http");

    let unknown = controller
        .execute(write_attribute(http.clone(), "bogus", 1))
        .unwrap_err();
    assert_eq!(unknown.message_key, "unknownAttribute");
    assert_eq!(unknown.parameter.as_deref(), Some("bogus"));

    let invalid = controller
        .execute(write_attribute(http, "port", -1))
        .unwrap_err();
    assert_eq!(invalid.message_key, "invalidParameter");
    assert_eq!(invalid.parameter.as_deref(), Some("port"));
}

#[test]
fn resource_with_children_cannot_be_removed() {
    let (controller, _) = standalone();
    let group = seed_standard(&controller, &Address::root());
    controller.execute(add_socket_binding(&group, "http", 8080)).unwrap();

    let failed = controller.execute(remove(group.clone())).unwrap_err();

    assert_eq!(failed.message_key, "operationFailed");
    assert!(controller.tree().read(&group, false).is_ok());
}

#[test]
fn concurrent_requests_all_commit() {
    let (controller, container) = standalone();
    let group = seed_standard(&controller, &Address::root());
    let base = controller.tree().version();

    thread::scope(|s| {
        for i in 0..8_i64 {
            let controller = controller.clone();
            let group = group.clone();
            s.spawn(move || {
                controller
                    .execute(add_remote_outbound(&group, &format!("out-{i}"), "localhost", 1000 + i))
                    .unwrap();
            });
        }
    });

    assert_eq!(controller.tree().version(), base + 8);
    for i in 0..8 {
        assert!(container.contains(&service(&format!(
            "org.wildfly.network.outbound-socket-binding.out-{i}"
        ))));
    }
}

#[test]
fn racing_adds_of_one_name_admit_exactly_one() {
    let (controller, container) = standalone();
    let group = seed_standard(&controller, &Address::root());
    let barrier = Barrier::new(2);

    let (inbound, outbound) = thread::scope(|s| {
        let inbound = s.spawn(|| {
            barrier.wait();
            controller.execute(add_socket_binding(&group, "dup", 9000))
        });
        let outbound = s.spawn(|| {
            barrier.wait();
            controller.execute(add_remote_outbound(&group, "dup", "localhost", 9000))
        });
        (inbound.join().unwrap(), outbound.join().unwrap())
    });

    assert!(inbound.is_ok() ^ outbound.is_ok());
    let loser = inbound.as_ref().err().or(outbound.as_ref().err()).unwrap();
    assert_eq!(loser.message_key, "duplicateName");
    let (inbound, outbound) = (inbound.is_ok(), outbound.is_ok());
    assert_eq!(
        container.contains(&service("org.wildfly.network.socket-binding.dup")),
        inbound
    );
    assert_eq!(
        container.contains(&service("org.wildfly.network.outbound-socket-binding.dup")),
        outbound
    );
}

#[test]
fn same_collection_race_loser_sees_duplicate_name() {
    let mut operations = ModelController::standard_operations();
    let group = group(&Address::root(), "standard");
    let contested = group.append(REMOTE_DESTINATION_OUTBOUND_SOCKET_BINDING, "dup");
    let add = operations.find(&contested, "add").unwrap();
    // both requests finish their model stage before either may commit
    let model_done = Arc::new(Barrier::new(2));
    let gate = Arc::clone(&model_done);
    operations.register_operation(
        &contested,
        "add",
        op(move |ctx, request| {
            add.execute(ctx, request)?;
            gate.wait();
            Ok(())
        }),
    );
    let container = Arc::new(mgmt_service::InMemoryServiceContainer::new());
    let controller = ModelController::with_operations(
        &ControllerConfig::default(),
        container.clone(),
        operations,
    )
    .unwrap();
    seed_standard(&controller, &Address::root());
    let version = controller.tree().version();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2_i64)
            .map(|i| {
                let controller = controller.clone();
                let group = group.clone();
                s.spawn(move || {
                    controller.execute(add_remote_outbound(&group, "dup", "localhost", 2500 + i))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.message_key, "duplicateName");
    assert!(matches!(
        loser.cause,
        ControllerError::Tree(mgmt_tree::TreeError::DuplicateName { .. })
    ));
    assert!(loser.rollback_warnings.is_empty());
    assert_eq!(controller.tree().version(), version + 1);
    assert!(container.contains(&service("org.wildfly.network.outbound-socket-binding.dup")));
}
