use crate::client::ContactClient;
use crate::compare::compare;
use crate::error::CogError;
use crate::step::{
    errored, failed, optional_string, passed, require_string, require_value, Step,
};
use async_trait::async_trait;
use cog_proto::field_definition::{Optionality, Type as FieldType};
use cog_proto::step_definition::Type as StepType;
use cog_proto::{FieldDefinition, RunStepResponse, StepDefinition};
use serde_json::Value;
use std::sync::Arc;

pub struct ContactFieldEquals {
    client: Arc<dyn ContactClient>,
}

impl ContactFieldEquals {
    pub const STEP_ID: &'static str = "ContactFieldEquals";

    pub fn new(client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        Box::new(Self { client })
    }

    pub fn definition() -> StepDefinition {
        StepDefinition {
            step_id: Self::STEP_ID.into(),
            name: "Check a field on an Eloqua contact".into(),
            r#type: StepType::Validation.into(),
            expression:
                "the (?<field>.+) field on eloqua contact (?<email>.+) should (?<operator>be less than|be greater than|be|contain|not be|not contain) (?<expectedValue>.+)"
                    .into(),
            expected_fields: vec![
                FieldDefinition {
                    key: "email".into(),
                    r#type: FieldType::Email.into(),
                    description: "Contact's email address".into(),
                    ..Default::default()
                },
                FieldDefinition {
                    key: "field".into(),
                    r#type: FieldType::String.into(),
                    description: "Field name to check".into(),
                    ..Default::default()
                },
                FieldDefinition {
                    key: "operator".into(),
                    r#type: FieldType::String.into(),
                    description: "Check Logic (be, not be, contain, not contain, be greater than, be less than)".into(),
                    optionality: Optionality::Optional.into(),
                    ..Default::default()
                },
                FieldDefinition {
                    key: "expectedValue".into(),
                    r#type: FieldType::Anyscalar.into(),
                    description: "Expected field value".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }
}

#[async_trait]
impl Step for ContactFieldEquals {
    async fn execute(&self, step: cog_proto::Step) -> Result<RunStepResponse, CogError> {
        let data = step.data.unwrap_or_default();
        let email = require_string(&data, "email")?;
        let field = require_string(&data, "field")?;
        let operator = optional_string(&data, "operator").unwrap_or_else(|| "be".into());
        let expected = require_value(&data, "expectedValue")?;

        let results = match self.client.search_contacts_by_email(&email).await {
            Ok(results) => results,
            Err(e) => {
                return Ok(errored(
                    "There was a problem connecting to Eloqua: %s",
                    vec![e.to_string().into()],
                    vec![],
                ))
            }
        };

        let Some(contact) = results.elements.first() else {
            return Ok(errored(
                "No contact found for email %s",
                vec![email.into()],
                vec![],
            ));
        };
        let Some(actual) = contact.get(&field) else {
            return Ok(errored(
                "The %s field does not exist on contact %s",
                vec![field.into(), email.into()],
                vec![],
            ));
        };

        match compare(&operator, actual, &expected) {
            Ok(true) => Ok(passed(
                "The %s field was set to %s, as expected",
                vec![field.into(), actual.clone()],
                vec![],
            )),
            Ok(false) => Ok(failed(
                "Expected %s field to %s %s, but it was actually %s",
                vec![
                    field.into(),
                    operator.into(),
                    expected,
                    actual.clone(),
                ],
                vec![],
            )),
            Err(e) => Ok(errored(
                "There was an error checking the %s field: %s",
                vec![field.into(), Value::String(e.to_string())],
                vec![],
            )),
        }
    }
}
