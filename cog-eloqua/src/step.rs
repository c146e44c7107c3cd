//! Step handler trait plus the response, record, and payload helpers
//! shared by every step implementation.

use crate::client::fields::Contact;
use crate::client::ContactClient;
use crate::error::CogError;
use async_trait::async_trait;
use cog_proto::run_step_response::Outcome;
use cog_proto::step_record;
use cog_proto::value::{json_to_struct, json_to_value, value_to_json};
use cog_proto::{RunStepResponse, StepRecord};
use std::sync::Arc;

/// Constructs a step handler around an authenticated client.
pub type StepFactory = fn(Arc<dyn ContactClient>) -> Box<dyn Step>;

/// One supported automation action or validation.
///
/// `execute` returns the resolved outcome, or a [`CogError`] for faults
/// that escape the handler; the dispatch service owns the single point
/// where those faults become ERROR outcomes.
#[async_trait]
pub trait Step: Send + Sync {
    async fn execute(&self, step: cog_proto::Step) -> Result<RunStepResponse, CogError>;
}

pub fn passed(
    format: &str,
    args: Vec<serde_json::Value>,
    records: Vec<StepRecord>,
) -> RunStepResponse {
    response(Outcome::Passed, format, args, records)
}

pub fn failed(
    format: &str,
    args: Vec<serde_json::Value>,
    records: Vec<StepRecord>,
) -> RunStepResponse {
    response(Outcome::Failed, format, args, records)
}

pub fn errored(
    format: &str,
    args: Vec<serde_json::Value>,
    records: Vec<StepRecord>,
) -> RunStepResponse {
    response(Outcome::Error, format, args, records)
}

fn response(
    outcome: Outcome,
    format: &str,
    args: Vec<serde_json::Value>,
    records: Vec<StepRecord>,
) -> RunStepResponse {
    RunStepResponse {
        outcome: outcome.into(),
        message_format: format.to_owned(),
        message_args: args.iter().map(json_to_value).collect(),
        records,
    }
}

pub fn key_value_record(id: &str, name: &str, data: &Contact) -> StepRecord {
    StepRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        value: Some(step_record::Value::KeyValue(json_to_struct(data))),
    }
}

/// Step payload accessors. The payload is structurally validated only:
/// presence and basic shape, no schema checks beyond that.
pub fn require_string(data: &prost_types::Struct, key: &str) -> Result<String, CogError> {
    match optional_value(data, key) {
        None | Some(serde_json::Value::Null) => Err(CogError::MissingField(key.to_owned())),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(other) => Ok(other.to_string()),
    }
}

pub fn require_map(data: &prost_types::Struct, key: &str) -> Result<Contact, CogError> {
    match optional_value(data, key) {
        None | Some(serde_json::Value::Null) => Err(CogError::MissingField(key.to_owned())),
        Some(serde_json::Value::Object(map)) => Ok(map),
        Some(_) => Err(CogError::InvalidField(key.to_owned(), "a map")),
    }
}

pub fn require_value(data: &prost_types::Struct, key: &str) -> Result<serde_json::Value, CogError> {
    match optional_value(data, key) {
        None | Some(serde_json::Value::Null) => Err(CogError::MissingField(key.to_owned())),
        Some(value) => Ok(value),
    }
}

pub fn optional_string(data: &prost_types::Struct, key: &str) -> Option<String> {
    match optional_value(data, key)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

/// Ordinal of this step within the host's scenario, supplied by the host
/// on the payload. Defaults to 1.
pub fn step_order(data: &prost_types::Struct) -> u64 {
    match optional_value(data, "__stepOrder") {
        Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(1),
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(1),
        _ => 1,
    }
}

fn optional_value(data: &prost_types::Struct, key: &str) -> Option<serde_json::Value> {
    data.fields.get(key).map(value_to_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> prost_types::Struct {
        json_to_struct(value.as_object().unwrap())
    }

    #[test]
    fn require_string_accepts_scalars() {
        let data = payload(json!({ "email": "a@example.com", "count": 3 }));
        assert_eq!(require_string(&data, "email").unwrap(), "a@example.com");
        assert_eq!(require_string(&data, "count").unwrap(), "3");
        assert!(matches!(
            require_string(&data, "missing"),
            Err(CogError::MissingField(_))
        ));
    }

    #[test]
    fn require_map_rejects_scalars() {
        let data = payload(json!({ "contact": { "a": 1 }, "email": "x" }));
        assert_eq!(require_map(&data, "contact").unwrap().len(), 1);
        assert!(matches!(
            require_map(&data, "email"),
            Err(CogError::InvalidField(..))
        ));
    }

    #[test]
    fn step_order_defaults_to_one() {
        assert_eq!(step_order(&payload(json!({}))), 1);
        assert_eq!(step_order(&payload(json!({ "__stepOrder": 3 }))), 3);
        assert_eq!(step_order(&payload(json!({ "__stepOrder": "4" }))), 4);
    }

    #[test]
    fn responses_carry_outcome_and_args() {
        let response = errored("Unknown step %s", vec![json!("Nope")], vec![]);
        assert_eq!(response.outcome, i32::from(Outcome::Error));
        assert_eq!(response.message_format, "Unknown step %s");
        assert_eq!(response.message_args.len(), 1);
    }
}
