use crate::client::ContactClient;
use crate::error::CogError;
use crate::step::{errored, failed, key_value_record, passed, require_string, Step};
use async_trait::async_trait;
use cog_proto::field_definition::Type as FieldType;
use cog_proto::record_definition::Type as RecordType;
use cog_proto::step_definition::Type as StepType;
use cog_proto::{FieldDefinition, RecordDefinition, RunStepResponse, StepDefinition};
use std::sync::Arc;

pub struct DiscoverContact {
    client: Arc<dyn ContactClient>,
}

impl DiscoverContact {
    pub const STEP_ID: &'static str = "DiscoverContact";

    pub fn new(client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        Box::new(Self { client })
    }

    pub fn definition() -> StepDefinition {
        let guaranteed = |key: &str, r#type: FieldType, description: &str| FieldDefinition {
            key: key.into(),
            r#type: r#type.into(),
            description: description.into(),
            ..Default::default()
        };

        StepDefinition {
            step_id: Self::STEP_ID.into(),
            name: "Discover fields on an Eloqua contact".into(),
            r#type: StepType::Action.into(),
            expression: "discover fields on eloqua contact (?<email>.+)".into(),
            expected_fields: vec![FieldDefinition {
                key: "email".into(),
                r#type: FieldType::Email.into(),
                description: "Contact's email address".into(),
                ..Default::default()
            }],
            expected_records: vec![RecordDefinition {
                id: "contact".into(),
                r#type: RecordType::Keyvalue.into(),
                guaranteed_fields: vec![
                    guaranteed("Id", FieldType::Numeric, "Contact's Eloqua ID"),
                    guaranteed("CreatedDate", FieldType::Datetime, "Contact's Created Date"),
                    guaranteed(
                        "LastModifiedDate",
                        FieldType::Datetime,
                        "Contact's Last Modified Date",
                    ),
                ],
                may_have_more_fields: true,
            }],
            ..Default::default()
        }
    }
}

#[async_trait]
impl Step for DiscoverContact {
    async fn execute(&self, step: cog_proto::Step) -> Result<RunStepResponse, CogError> {
        let data = step.data.unwrap_or_default();
        let email = require_string(&data, "email")?;

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

        match results.elements.first() {
            None => Ok(failed(
                "No contact found for email %s",
                vec![email.into()],
                vec![],
            )),
            Some(contact) => Ok(passed(
                "Successfully discovered fields on Eloqua contact",
                vec![],
                vec![key_value_record(
                    "discoverContact",
                    "Discovered Contact",
                    contact,
                )],
            )),
        }
    }
}
