//! gRPC dispatch service.
//!
//! Maps incoming step identifiers to handlers via the step registry,
//! authenticates an Eloqua client at most once per connection, and
//! converts every fault raised during construction or execution into a
//! structured ERROR outcome. Faults never escape to the transport layer
//! as gRPC errors.

use crate::client::{expected_auth_fields, ClientFactory, ContactClient};
use crate::registry::StepRegistry;
use crate::step::errored;
use cog_proto::cog_service_server::CogService;
use cog_proto::{CogManifest, ManifestRequest, RunStepRequest, RunStepResponse};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, warn};

const COG_NAME: &str = "automatoninc/eloqua";
const COG_LABEL: &str = "Eloqua";

#[derive(Clone)]
pub struct Cog {
    registry: Arc<StepRegistry>,
    factory: Arc<dyn ClientFactory>,
}

impl Cog {
    pub fn new(registry: Arc<StepRegistry>, factory: Arc<dyn ClientFactory>) -> Self {
        Self { registry, factory }
    }

    /// Executes one step request against the connection's client,
    /// authenticating it first if this is the connection's first
    /// dispatched step. Unknown step identifiers short-circuit before any
    /// client is constructed.
    async fn dispatch(
        &self,
        step: cog_proto::Step,
        client_slot: &mut Option<Arc<dyn ContactClient>>,
        metadata: &MetadataMap,
    ) -> RunStepResponse {
        let Some(entry) = self.registry.get(&step.step_id) else {
            warn!(step_id = %step.step_id, "unknown step");
            return errored("Unknown step %s", vec![step.step_id.clone().into()], vec![]);
        };

        let client = match client_slot {
            Some(client) => client.clone(),
            None => match self.factory.authenticate(metadata) {
                Ok(client) => {
                    *client_slot = Some(client.clone());
                    client
                }
                Err(e) => return errored("%s", vec![e.to_string().into()], vec![]),
            },
        };

        debug!(step_id = %step.step_id, "executing step");
        let handler = entry.instantiate(client);
        match handler.execute(step).await {
            Ok(response) => response,
            Err(e) => errored("%s", vec![e.to_string().into()], vec![]),
        }
    }
}

#[tonic::async_trait]
impl CogService for Cog {
    async fn get_manifest(
        &self,
        _request: Request<ManifestRequest>,
    ) -> Result<Response<CogManifest>, Status> {
        Ok(Response::new(CogManifest {
            name: COG_NAME.into(),
            label: COG_LABEL.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            step_definitions: self.registry.definitions(),
            auth_fields: expected_auth_fields(),
            ..Default::default()
        }))
    }

    async fn run_step(
        &self,
        request: Request<RunStepRequest>,
    ) -> Result<Response<RunStepResponse>, Status> {
        let metadata = request.metadata().clone();
        let step = request.into_inner().step.unwrap_or_default();

        let mut client = None;
        let response = self.dispatch(step, &mut client, &metadata).await;
        Ok(Response::new(response))
    }

    type RunStepsStream = ReceiverStream<Result<RunStepResponse, Status>>;

    async fn run_steps(
        &self,
        request: Request<Streaming<RunStepRequest>>,
    ) -> Result<Response<Self::RunStepsStream>, Status> {
        let metadata = request.metadata().clone();
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(32);

        let cog = self.clone();
        tokio::spawn(async move {
            // One client for the life of the stream; one response per
            // request, in arrival order.
            let mut client = None;
            loop {
                match inbound.message().await {
                    Ok(Some(request)) => {
                        let step = request.step.unwrap_or_default();
                        let response = cog.dispatch(step, &mut client, &metadata).await;
                        if tx.send(Ok(response)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(status) => {
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::EloquaError;
    use crate::error::CogError;
    use crate::step::Step;
    use crate::steps::test_support::StubClient;
    use async_trait::async_trait;
    use cog_proto::run_step_response::Outcome;
    use cog_proto::value::value_to_json;
    use cog_proto::StepDefinition;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts authentications and hands out stub clients.
    struct CountingFactory {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingFactory {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    impl ClientFactory for CountingFactory {
        fn authenticate(
            &self,
            _metadata: &MetadataMap,
        ) -> Result<Arc<dyn ContactClient>, EloquaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EloquaError::MissingCredential("password"));
            }
            Ok(Arc::new(StubClient::default().with_delete_ok()))
        }
    }

    struct FaultyStep;

    #[async_trait]
    impl Step for FaultyStep {
        async fn execute(&self, _step: cog_proto::Step) -> Result<RunStepResponse, CogError> {
            Err(CogError::MissingField("boom".into()))
        }
    }

    fn faulty_definition() -> StepDefinition {
        StepDefinition {
            step_id: "FaultyStep".into(),
            ..Default::default()
        }
    }

    fn faulty_factory(_client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        Box::new(FaultyStep)
    }

    fn proto_step(step_id: &str, data: serde_json::Value) -> cog_proto::Step {
        cog_proto::Step {
            step_id: step_id.into(),
            data: Some(cog_proto::value::json_to_struct(data.as_object().unwrap())),
        }
    }

    #[tokio::test]
    async fn unknown_step_never_authenticates() {
        let factory = Arc::new(CountingFactory::new());
        let cog = Cog::new(Arc::new(StepRegistry::all_steps()), factory.clone());

        let mut client = None;
        let response = cog
            .dispatch(
                proto_step("NotRealStep", json!({})),
                &mut client,
                &MetadataMap::new(),
            )
            .await;

        assert_eq!(response.outcome, i32::from(Outcome::Error));
        assert_eq!(response.message_format, "Unknown step %s");
        assert_eq!(value_to_json(&response.message_args[0]), json!("NotRealStep"));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 0);
        assert!(client.is_none());
    }

    #[tokio::test]
    async fn authenticates_once_per_connection() {
        let factory = Arc::new(CountingFactory::new());
        let cog = Cog::new(Arc::new(StepRegistry::all_steps()), factory.clone());

        let mut client = None;
        let step = proto_step("DeleteContact", json!({ "email": "a@example.com" }));
        let first = cog
            .dispatch(step.clone(), &mut client, &MetadataMap::new())
            .await;
        let second = cog.dispatch(step, &mut client, &MetadataMap::new()).await;

        assert_eq!(first.outcome, i32::from(Outcome::Passed));
        assert_eq!(second.outcome, i32::from(Outcome::Passed));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
        assert!(client.is_some());
    }

    #[tokio::test]
    async fn authentication_failure_is_an_error_outcome() {
        let cog = Cog::new(
            Arc::new(StepRegistry::all_steps()),
            Arc::new(CountingFactory::failing()),
        );

        let mut client = None;
        let response = cog
            .dispatch(
                proto_step("DeleteContact", json!({ "email": "a@example.com" })),
                &mut client,
                &MetadataMap::new(),
            )
            .await;

        assert_eq!(response.outcome, i32::from(Outcome::Error));
        assert!(client.is_none());
    }

    #[tokio::test]
    async fn step_fault_is_converted_at_the_dispatch_boundary() {
        let mut registry = StepRegistry::new();
        registry.register("FaultyStep", faulty_definition, faulty_factory);
        let cog = Cog::new(Arc::new(registry), Arc::new(CountingFactory::new()));

        let mut client = None;
        let response = cog
            .dispatch(
                proto_step("FaultyStep", json!({})),
                &mut client,
                &MetadataMap::new(),
            )
            .await;

        assert_eq!(response.outcome, i32::from(Outcome::Error));
        assert_eq!(
            value_to_json(&response.message_args[0]),
            json!("Missing required step input: boom")
        );
    }

    #[tokio::test]
    async fn manifest_lists_steps_and_auth_fields() {
        let cog = Cog::new(
            Arc::new(StepRegistry::all_steps()),
            Arc::new(CountingFactory::new()),
        );

        let manifest = cog
            .get_manifest(Request::new(ManifestRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(manifest.name, "automatoninc/eloqua");
        assert_eq!(manifest.label, "Eloqua");
        assert_eq!(manifest.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(manifest.step_definitions.len(), 4);
        let auth_keys: Vec<_> = manifest.auth_fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(auth_keys, vec!["companyName", "username", "password"]);
    }
}
