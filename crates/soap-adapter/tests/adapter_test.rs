use serde_json::json;
use soap_adapter::mock::{MockTransport, MockTransportFactory};
use soap_adapter::{
    Adapter, AdapterConfig, AdapterError, ClassifiedError, Condition, Message, Model, Operation,
    Property, PropertyKind, Query, RecordError, RecordOutcome, RecordResult, Resource, SoapFault,
    Value, SERVER_UNAVAILABLE,
};
use std::sync::Arc;

const CONFIG: &str = r#"{
    "endpoint": "http://localhost:8080/HeffalumpsWS",
    "operations": {
        "create": "createHeffalump",
        "read": "getHeffalump",
        "update": "updateHeffalump",
        "delete": "deleteHeffalump",
        "all": "allHeffalumps"
    },
    "enable_mock_setters": true
}"#;

fn heffalump() -> Arc<Model> {
    Model::builder("Heffalump")
        .property(Property::new("id", PropertyKind::Integer).key())
        .property(Property::new("color", PropertyKind::Text))
        .property(Property::new("num_spots", PropertyKind::Integer))
        .property(Property::new("striped", PropertyKind::Boolean))
        .build()
        .unwrap()
}

/// Adapter whose transport was swapped for `mock` after construction.
fn adapter_with(mock: &MockTransport) -> (Adapter, Arc<MockTransportFactory>) {
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();
    let factory = Arc::new(MockTransportFactory::new(MockTransport::new()));
    let mut adapter = Adapter::new("default", config, factory.clone()).unwrap();
    adapter.set_transport(Arc::new(mock.clone())).unwrap();
    (adapter, factory)
}

fn object(value: serde_json::Value) -> Message {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn create_sets_the_identity_field() {
    let mock = MockTransport::new();
    mock.expect_call("createHeffalump")
        .with_message(object(json!({"id": null, "color": "peach", "num_spots": null, "striped": null})))
        .return_body(r#"{"heffalump": {"id": "2", "color": "peach"}}"#);
    let (adapter, factory) = adapter_with(&mock);

    let mut resources = vec![Resource::new(heffalump()).with("color", "peach").unwrap()];
    assert!(resources[0].get("id").unwrap().is_nil());

    let created = adapter.create(&mut resources).await.unwrap();

    assert_eq!(created, 1);
    assert_eq!(resources[0].get("id"), Some(&Value::Integer(2)));
    assert_eq!(resources[0].get("color"), Some(&Value::from("peach")));
    assert!(!resources[0].is_new());
    assert_eq!(factory.connections(), 0);
    mock.verify();
}

#[tokio::test]
async fn create_ignores_fields_the_model_does_not_map() {
    let mock = MockTransport::new();
    mock.expect_call("createHeffalump")
        .return_body(r#"{"id": "3", "color": "peach", "trunk_length": "12", "created_by": "admin"}"#);
    let (adapter, _) = adapter_with(&mock);

    let mut resources = vec![Resource::new(heffalump()).with("color", "peach").unwrap()];
    adapter.create(&mut resources).await.unwrap();

    assert_eq!(resources[0].get("id"), Some(&Value::Integer(3)));
    assert_eq!(resources[0].get("trunk_length"), None);
}

#[tokio::test]
async fn create_with_empty_body_still_counts_the_attempt() {
    let mock = MockTransport::new();
    mock.expect_call("createHeffalump").return_empty();
    mock.expect_call("createHeffalump").return_body("  ");
    let (adapter, _) = adapter_with(&mock);

    let mut resources = vec![
        Resource::new(heffalump()).with("color", "red").unwrap(),
        Resource::new(heffalump()).with("color", "blue").unwrap(),
    ];
    let before = resources.clone();

    assert_eq!(adapter.create(&mut resources).await.unwrap(), 2);
    assert_eq!(resources, before);
}

#[tokio::test]
async fn update_keeps_local_assignment_and_reconciles() {
    let mock = MockTransport::new();
    mock.expect_call("updateHeffalump")
        .with_message(object(json!({"id": 5, "color": "violet", "num_spots": null, "striped": null})))
        .return_body(r#"{"id": "5", "color": "violet"}"#);
    let (adapter, _) = adapter_with(&mock);

    let mut resources = vec![Resource::new(heffalump())
        .with("id", 5)
        .unwrap()
        .with("color", "indigo")
        .unwrap()];
    let updated = adapter
        .update(&[("color", Value::from("violet"))], &mut resources)
        .await
        .unwrap();

    assert_eq!(updated, 1);
    assert_eq!(resources[0].get("id"), Some(&Value::Integer(5)));
    assert_eq!(resources[0].get("color"), Some(&Value::from("violet")));
    mock.verify();
}

#[tokio::test]
async fn update_does_not_alter_other_fields() {
    let mock = MockTransport::new();
    mock.expect_call("updateHeffalump").return_body(r#"{"id": "5", "num_spots": "3"}"#);
    let (adapter, _) = adapter_with(&mock);

    let mut resources = vec![Resource::new(heffalump())
        .with("id", 5)
        .unwrap()
        .with("color", "indigo")
        .unwrap()];
    adapter
        .update(&[("num_spots", Value::from(3))], &mut resources)
        .await
        .unwrap();

    assert_eq!(resources[0].get("color"), Some(&Value::from("indigo")));
    assert_eq!(resources[0].get("num_spots"), Some(&Value::Integer(3)));
}

#[tokio::test]
async fn outage_on_create_is_server_unavailable() {
    let mock = MockTransport::new();
    mock.expect_call("createHeffalump").return_fault(SoapFault::new(
        Operation::Create,
        "create failed",
        RecordResult::new(vec![RecordOutcome::failed(RecordError::new(
            SERVER_UNAVAILABLE,
            "scheduled maintenance",
        ))]),
    ));
    let (adapter, _) = adapter_with(&mock);

    let mut resources = vec![Resource::new(heffalump()).with("color", "peach").unwrap()];
    let err = adapter.create(&mut resources).await.unwrap_err();

    assert!(err.is_server_unavailable());
    assert_eq!(err.to_string(), "the remote service is currently unavailable");
}

#[tokio::test]
async fn domain_fault_keeps_per_record_detail() {
    let fault = SoapFault::new(
        Operation::Delete,
        "delete failed",
        RecordResult::new(vec![
            RecordOutcome::succeeded(),
            RecordOutcome::failed(RecordError::new("ENTITY_IS_LOCKED", "locked by import")),
        ]),
    );
    let mock = MockTransport::new();
    mock.expect_call("deleteHeffalump").return_fault(fault.clone());
    let (adapter, _) = adapter_with(&mock);

    let resources = vec![Resource::new(heffalump()).with("id", 7).unwrap()];
    let err = adapter.delete(&resources).await.unwrap_err();

    match err {
        AdapterError::Remote(ClassifiedError::Domain(returned)) => {
            assert_eq!(returned, fault);
            assert_eq!(returned.result().successful_records().count(), 1);
            assert_eq!(returned.result_message(), "ENTITY_IS_LOCKED: locked by import");
        }
        other => panic!("expected a domain fault, got {other:?}"),
    }
}

#[tokio::test]
async fn read_with_absent_body_is_empty() {
    let mock = MockTransport::new();
    mock.expect_call("allHeffalumps").return_empty();
    let (adapter, _) = adapter_with(&mock);

    let query = Query::all(heffalump()).filter(Condition::eql("color", "mauve"));
    let resources = adapter.read(&query).await.unwrap();

    assert!(resources.is_empty());
}

#[tokio::test]
async fn read_outage_is_classified() {
    let mock = MockTransport::new();
    mock.expect_call("allHeffalumps").return_fault(SoapFault::new(
        Operation::Query,
        "query failed",
        RecordResult::new(vec![RecordOutcome::failed(RecordError::new(SERVER_UNAVAILABLE, "down"))]),
    ));
    let (adapter, _) = adapter_with(&mock);

    let err = adapter.read(&Query::all(heffalump())).await.unwrap_err();
    assert!(err.is_server_unavailable());
}

#[tokio::test]
async fn get_returns_the_raw_response() {
    let mock = MockTransport::new();
    mock.expect_call("getHeffalump")
        .with_message(object(json!({"id": 2})))
        .return_body(r#"{"id": "2", "color": "peach"}"#);
    let (adapter, _) = adapter_with(&mock);

    let response = adapter.get(&heffalump(), &[Value::from(2)]).await.unwrap();
    assert_eq!(response.body(), Some(r#"{"id": "2", "color": "peach"}"#));
}

#[tokio::test]
async fn transport_is_built_lazily_from_the_factory() {
    let mock = MockTransport::new();
    mock.expect_call("getHeffalump").return_empty();
    let factory = Arc::new(MockTransportFactory::new(mock.clone()));
    let adapter = Adapter::new(
        "default",
        AdapterConfig::from_json_str(CONFIG).unwrap(),
        factory.clone(),
    )
    .unwrap();

    assert_eq!(factory.connections(), 0);
    adapter.get(&heffalump(), &[Value::from(1)]).await.unwrap();
    assert_eq!(factory.connections(), 1);
    assert_eq!(
        factory.last_options().unwrap().endpoint,
        "http://localhost:8080/HeffalumpsWS"
    );
}
