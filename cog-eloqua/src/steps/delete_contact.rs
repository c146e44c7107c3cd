use crate::client::ContactClient;
use crate::error::CogError;
use crate::step::{errored, passed, require_string, Step};
use async_trait::async_trait;
use cog_proto::field_definition::Type as FieldType;
use cog_proto::step_definition::Type as StepType;
use cog_proto::{FieldDefinition, RunStepResponse, StepDefinition};
use std::sync::Arc;

pub struct DeleteContact {
    client: Arc<dyn ContactClient>,
}

impl DeleteContact {
    pub const STEP_ID: &'static str = "DeleteContact";

    pub fn new(client: Arc<dyn ContactClient>) -> Box<dyn Step> {
        Box::new(Self { client })
    }

    pub fn definition() -> StepDefinition {
        StepDefinition {
            step_id: Self::STEP_ID.into(),
            name: "Delete an Eloqua contact".into(),
            r#type: StepType::Action.into(),
            expression: "delete the (?<email>.+) eloqua contact".into(),
            expected_fields: vec![FieldDefinition {
                key: "email".into(),
                r#type: FieldType::Email.into(),
                description: "Contact's email address".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

#[async_trait]
impl Step for DeleteContact {
    async fn execute(&self, step: cog_proto::Step) -> Result<RunStepResponse, CogError> {
        let data = step.data.unwrap_or_default();
        let email = require_string(&data, "email")?;

        match self.client.delete_contact_by_email(&email).await {
            Ok(()) => Ok(passed(
                "Successfully deleted Contact %s",
                vec![email.into()],
                vec![],
            )),
            Err(e) => Ok(errored(
                "There was a problem deleting the Contact. %s",
                vec![e.to_string().into()],
                vec![],
            )),
        }
    }
}
