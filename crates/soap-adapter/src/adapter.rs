//! # Adapter
//!
//! The [`Adapter`] is the entry point a mapping runtime talks to. Each public
//! operation follows the same shape:
//!
//! 1. build the outgoing payload (a resource's attributes, its key, or a translated query),
//! 2. dispatch it through the [`Connection`] to the configured remote operation,
//! 3. parse the response and reconcile it onto the resource(s),
//! 4. route any remote fault through the [`fault`](crate::fault) classifier.
//!
//! Batch operations issue one remote call per resource, strictly in order. The
//! first failure aborts the rest of the batch; work already done for earlier
//! resources stays done.

use crate::config::AdapterConfig;
use crate::connection::Connection;
use crate::error::AdapterError;
use crate::model::{Model, Resource, Value};
use crate::parser::{JsonResponseParser, ResponseParser};
use crate::query::{FlatQueryTranslator, Query, QueryTranslator};
use crate::transport::{Response, Transport, TransportFactory};
use std::sync::Arc;
use tracing::{debug, info, instrument, Span};

pub struct Adapter {
    name: String,
    connection: Connection,
    parser: Box<dyn ResponseParser>,
    translator: Box<dyn QueryTranslator>,
    span: Span,
}

impl Adapter {
    /// Creates an adapter for the repository `name`.
    ///
    /// The transport is not built until the first remote call.
    pub fn new(
        name: impl Into<String>,
        config: AdapterConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self, AdapterError> {
        config.validate()?;
        let name = name.into();
        let span = tracing::info_span!("soap_adapter", repository = %name);
        let connection = Connection::new(&config, factory).with_span(span.clone());
        Ok(Self {
            name,
            connection,
            parser: Box::new(JsonResponseParser),
            translator: Box::new(FlatQueryTranslator),
            span,
        })
    }

    pub fn with_parser(mut self, parser: impl ResponseParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_translator(mut self, translator: impl QueryTranslator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Records every operation of this adapter, and of its connection, under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.connection = self.connection.with_span(span.clone());
        self.span = span;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Replaces the transport with a test double. See [`Connection::set_transport`].
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) -> Result<(), AdapterError> {
        self.connection.set_transport(transport)
    }

    /// Fetches one record by key and returns the raw response.
    #[instrument(parent = &self.span, skip_all, fields(model = model.name()))]
    pub async fn get(&self, model: &Model, keys: &[Value]) -> Result<Response, AdapterError> {
        let message = model.key_message(keys)?;
        debug!(?keys, "Get");
        Ok(self.connection.call_get(message).await?)
    }

    /// [`get`](Self::get) followed by reconciliation into a fresh resource.
    ///
    /// Returns `None` when the service answers without a body.
    pub async fn find(
        &self,
        model: &Arc<Model>,
        keys: &[Value],
    ) -> Result<Option<Resource>, AdapterError> {
        let response = self.get(model, keys).await?;
        if response.non_blank_body().is_none() {
            return Ok(None);
        }
        let mut resource = Resource::new(model.clone());
        self.update_attributes(&mut resource, response.body())?;
        Ok(Some(resource))
    }

    /// Runs `query` through the remote "query all" operation.
    #[instrument(parent = &self.span, skip_all, fields(model = query.model().name()))]
    pub async fn read(&self, query: &Query) -> Result<Vec<Resource>, AdapterError> {
        let model = query.model();
        let message = self.translator.translate(query)?;
        debug!(?message, "Read");

        let response = self.connection.call_query(message).await?;
        let Some(body) = response.non_blank_body() else {
            debug!("Empty response");
            return Ok(Vec::new());
        };

        let resources = self
            .parser
            .parse_records(body, model)?
            .into_iter()
            .map(|record| -> Result<Resource, AdapterError> {
                let mut resource = Resource::new(model.clone());
                for (field, value) in &record {
                    resource.set_field(field, value)?;
                }
                Ok(resource)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = resources.len(), "Read");
        Ok(resources)
    }

    /// Creates each resource remotely and reconciles the response onto it.
    ///
    /// Returns the number of resources given.
    #[instrument(parent = &self.span, skip_all, fields(count = resources.len()))]
    pub async fn create(&self, resources: &mut [Resource]) -> Result<usize, AdapterError> {
        for resource in resources.iter_mut() {
            let payload = resource.attributes();
            debug!(model = resource.model().name(), ?payload, "Create");
            let response = self.connection.call_create(payload).await?;
            self.update_attributes(resource, response.body())?;
            info!(model = resource.model().name(), key = ?resource.key(), "Created");
        }
        Ok(resources.len())
    }

    /// Applies `attributes` to each resource, then updates it remotely.
    ///
    /// The local assignment happens before the remote call and is kept whatever
    /// the call's outcome.
    #[instrument(parent = &self.span, skip_all, fields(count = resources.len()))]
    pub async fn update(
        &self,
        attributes: &[(&str, Value)],
        resources: &mut [Resource],
    ) -> Result<usize, AdapterError> {
        for resource in resources.iter_mut() {
            for (name, value) in attributes {
                resource.set(name, value.clone())?;
            }
            let payload = resource.attributes();
            debug!(model = resource.model().name(), ?payload, "Update");
            let response = self.connection.call_update(payload).await?;
            self.update_attributes(resource, response.body())?;
            info!(model = resource.model().name(), key = ?resource.key(), "Updated");
        }
        Ok(resources.len())
    }

    /// Deletes each resource remotely by key.
    #[instrument(parent = &self.span, skip_all, fields(count = resources.len()))]
    pub async fn delete(&self, resources: &[Resource]) -> Result<usize, AdapterError> {
        for resource in resources {
            let keys = resource.key_message()?;
            debug!(model = resource.model().name(), ?keys, "Delete");
            self.connection.call_delete(keys).await?;
            info!(model = resource.model().name(), key = ?resource.key(), "Deleted");
        }
        Ok(resources.len())
    }

    /// Sets every property of `resource` whose wire field appears in `body`.
    ///
    /// A missing or blank body leaves the resource untouched. Fields the model
    /// does not map are ignored.
    pub fn update_attributes(
        &self,
        resource: &mut Resource,
        body: Option<&str>,
    ) -> Result<(), AdapterError> {
        let Some(body) = body.filter(|b| !b.trim().is_empty()) else {
            return Ok(());
        };
        let model = resource.model().clone();
        let record = self.parser.parse_record(body, &model)?;
        for (field, value) in &record {
            if !resource.set_field(field, value)? {
                debug!(parent: &self.span, model = model.name(), field = %field, "Ignoring unmapped field");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("connection", &self.connection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OperationNames;
    use crate::fault::{ClassifiedError, SoapFault, SERVER_UNAVAILABLE};
    use crate::mock::{MockTransport, MockTransportFactory};
    use crate::model::{Message, Property, PropertyKind};
    use crate::connection::Operation;
    use crate::query::Condition;
    use crate::record::{RecordError, RecordOutcome, RecordResult};
    use serde_json::json;

    fn model() -> Arc<Model> {
        Model::builder("Heffalump")
            .property(Property::new("id", PropertyKind::Integer).key())
            .property(Property::new("color", PropertyKind::Text))
            .property(Property::new("num_spots", PropertyKind::Integer))
            .build()
            .unwrap()
    }

    fn adapter(mock: &MockTransport) -> Adapter {
        let config = AdapterConfig::new(
            "http://localhost/HeffalumpsWS",
            OperationNames {
                create: "createHeffalump".into(),
                read: "getHeffalump".into(),
                update: "updateHeffalump".into(),
                delete: "deleteHeffalump".into(),
                all: "allHeffalumps".into(),
            },
        );
        Adapter::new("default", config, Arc::new(MockTransportFactory::new(mock.clone()))).unwrap()
    }

    fn message(value: serde_json::Value) -> Message {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn rejected(operation: Operation, code: &str) -> SoapFault {
        SoapFault::new(
            operation,
            "remote call rejected",
            RecordResult::new(vec![RecordOutcome::failed(RecordError::new(code, "nope"))]),
        )
    }

    #[tokio::test]
    async fn update_applies_assignments_before_the_call() {
        let mock = MockTransport::new();
        mock.expect_call("updateHeffalump")
            .with_message(message(json!({"id": 5, "color": "violet", "num_spots": null})))
            .return_fault(rejected(Operation::Update, "FIELD_INTEGRITY_EXCEPTION"));
        let adapter = adapter(&mock);

        let mut resources = vec![Resource::new(model())
            .with("id", 5)
            .unwrap()
            .with("color", "indigo")
            .unwrap()];
        let err = adapter
            .update(&[("color", Value::from("violet"))], &mut resources)
            .await
            .unwrap_err();

        assert_eq!(err.domain_fault().unwrap().result_message(), "FIELD_INTEGRITY_EXCEPTION: nope");
        assert_eq!(resources[0].get("color"), Some(&Value::from("violet")));
        mock.verify();
    }

    #[tokio::test]
    async fn first_fault_aborts_the_batch() {
        let mock = MockTransport::new();
        mock.expect_call("createHeffalump").return_body(r#"{"id": "1"}"#);
        mock.expect_call("createHeffalump").return_fault(rejected(Operation::Create, SERVER_UNAVAILABLE));
        let adapter = adapter(&mock);

        let mut resources = vec![
            Resource::new(model()).with("color", "red").unwrap(),
            Resource::new(model()).with("color", "blue").unwrap(),
            Resource::new(model()).with("color", "green").unwrap(),
        ];
        let err = adapter.create(&mut resources).await.unwrap_err();

        assert!(matches!(err, AdapterError::Remote(ClassifiedError::ServerUnavailable)));
        assert_eq!(resources[0].get("id"), Some(&Value::Integer(1)));
        assert!(resources[2].is_new());
        assert_eq!(mock.calls().len(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn delete_sends_only_the_key() {
        let mock = MockTransport::new();
        mock.expect_call("deleteHeffalump")
            .with_message(message(json!({"id": 9})))
            .return_empty();
        let adapter = adapter(&mock);

        let resources = vec![Resource::new(model()).with("id", 9).unwrap().with("color", "x").unwrap()];
        assert_eq!(adapter.delete(&resources).await.unwrap(), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn delete_without_key_fails_before_calling() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        let resources = vec![Resource::new(model())];
        assert!(matches!(
            adapter.delete(&resources).await,
            Err(AdapterError::MissingKey { .. })
        ));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn get_routes_faults_through_the_classifier() {
        let mock = MockTransport::new();
        mock.expect_call("getHeffalump").return_fault(rejected(Operation::Read, "ENTITY_IS_DELETED"));
        let adapter = adapter(&mock);

        let err = adapter.get(&model(), &[Value::Integer(4)]).await.unwrap_err();
        assert_eq!(err.domain_fault().unwrap().operation(), Operation::Read);
    }

    #[tokio::test]
    async fn find_reconciles_into_a_fresh_resource() {
        let mock = MockTransport::new();
        mock.expect_call("getHeffalump")
            .with_message(message(json!({"id": 4})))
            .return_body(r#"{"heffalump": {"id": "4", "color": "plum"}}"#);
        mock.expect_call("getHeffalump").return_empty();
        let adapter = adapter(&mock);

        let found = adapter.find(&model(), &[Value::Integer(4)]).await.unwrap().unwrap();
        assert_eq!(found.get("color"), Some(&Value::from("plum")));
        assert!(adapter.find(&model(), &[Value::Integer(4)]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_materializes_one_resource_per_record() {
        let mock = MockTransport::new();
        mock.expect_call("allHeffalumps")
            .with_message(message(json!({
                "conditions": [{"field": "num_spots", "operator": "gt", "value": 1}],
                "limit": 2
            })))
            .return_body(r#"[{"id": "1", "num_spots": "2"}, {"id": "2", "num_spots": "5", "trunk": "long"}]"#);
        let adapter = adapter(&mock);

        let query = Query::all(model())
            .filter(Condition::gt("num_spots", 1))
            .with_limit(2);
        let resources = adapter.read(&query).await.unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].get("num_spots"), Some(&Value::Integer(5)));
        mock.verify();
    }

    #[tokio::test]
    async fn transport_override_is_gated() {
        let mock = MockTransport::new();
        let mut adapter = adapter(&mock);
        assert!(matches!(
            adapter.set_transport(Arc::new(MockTransport::new())),
            Err(AdapterError::Config(_))
        ));
    }

    #[test]
    fn blank_body_is_a_no_op() {
        let adapter = adapter(&MockTransport::new());
        let mut resource = Resource::new(model()).with("color", "peach").unwrap();
        let before = resource.clone();

        adapter.update_attributes(&mut resource, None).unwrap();
        adapter.update_attributes(&mut resource, Some("   ")).unwrap();
        assert_eq!(resource, before);
    }

    #[test]
    fn unparseable_body_is_a_parse_error() {
        let adapter = adapter(&MockTransport::new());
        let mut resource = Resource::new(model());
        assert!(matches!(
            adapter.update_attributes(&mut resource, Some("<heffalump>")),
            Err(AdapterError::Parse(_))
        ));
    }
}
