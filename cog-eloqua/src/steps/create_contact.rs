use crate::client::ContactClient;
use crate::error::CogError;
use crate::step::{errored, key_value_record, passed, require_map, step_order, Step};
use async_trait::async_trait;
use cog_proto::field_definition::Type as FieldType;
use cog_proto::step_definition::Type as StepType;
use cog_proto::{FieldDefinition, RunStepResponse, StepDefinition};
use serde_json::Value;
use std::sync::Arc;

pub struct CreateContact {
    client: Arc<dyn ContactClient>,
}

impl CreateContact {
    pub const STEP_ID: &'static str = "CreateContact";

    pub fn new(client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        Box::new(Self { client })
    }

    pub fn definition() -> StepDefinition {
        StepDefinition {
            step_id: Self::STEP_ID.into(),
            name: "Create an Eloqua contact".into(),
            r#type: StepType::Action.into(),
            expression: "create an eloqua contact".into(),
            expected_fields: vec![FieldDefinition {
                key: "contact".into(),
                r#type: FieldType::Map.into(),
                description: "A map of field names to field values".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

#[async_trait]
impl Step for CreateContact {
    async fn execute(&self, step: cog_proto::Step) -> Result<RunStepResponse, CogError> {
        let data = step.data.unwrap_or_default();
        let contact = require_map(&data, "contact")?;
        let ordinal = step_order(&data);

        match self.client.create_contact(&contact).await {
            Ok(created) => {
                let id = created.get("id").cloned().unwrap_or(Value::Null);
                let records = vec![
                    key_value_record("contact", "Created Contact", &created),
                    key_value_record(&format!("contact.{ordinal}"), "Created Contact", &created),
                ];
                Ok(passed(
                    "Successfully created Contact with ID %s",
                    vec![id],
                    records,
                ))
            }
            Err(e) => Ok(errored(
                "There was a problem creating the Contact. %s",
                vec![e.to_string().into()],
                vec![],
            )),
        }
    }
}
