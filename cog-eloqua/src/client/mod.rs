//! Eloqua client wrapper.
//!
//! [`EloquaClient`] sits between the steps and the raw REST surface: it
//! owns the connection-scoped field-id cache and translates contacts
//! between friendly and wire form on the way through. Steps depend on the
//! [`ContactClient`] trait so they can be exercised against stubs.

pub mod api;
pub mod error;
pub mod fields;

use crate::client::api::{EloquaApi, EloquaConfig, EloquaRest};
use crate::client::error::EloquaError;
use crate::client::fields::{
    deserialize_custom_fields, serialize_custom_fields, Contact, FieldMap,
};
use async_trait::async_trait;
use cog_proto::field_definition::{Optionality, Type as FieldType};
use cog_proto::FieldDefinition;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tonic::metadata::MetadataMap;
use tracing::warn;

/// Search result envelope: friendly-form elements plus whatever wrapper
/// metadata (page, pageSize, total) Eloqua returned, untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub elements: Vec<Contact>,
    #[serde(flatten)]
    pub envelope: serde_json::Map<String, Value>,
}

/// Contact operations consumed by the step handlers.
#[async_trait]
pub trait ContactClient: Send + Sync {
    async fn create_contact(&self, contact: &Contact) -> Result<Contact, EloquaError>;
    async fn delete_contact_by_email(&self, email: &str) -> Result<(), EloquaError>;
    async fn search_contacts_by_email(&self, email: &str) -> Result<SearchResults, EloquaError>;
}

pub struct EloquaClient {
    api: Arc<dyn EloquaApi>,
    field_cache: OnceCell<FieldMap>,
}

impl EloquaClient {
    pub fn new(api: Arc<dyn EloquaApi>) -> Self {
        Self {
            api,
            field_cache: OnceCell::new(),
        }
    }

    /// Returns the id -> internal-name map for contact custom fields,
    /// fetching it on first use. A failed fetch degrades to an empty map
    /// for the lifetime of this client: custom fields simply stop being
    /// translated, nothing raises.
    async fn field_map(&self) -> &FieldMap {
        self.field_cache
            .get_or_init(|| async {
                match self.api.get_contact_fields("partial").await {
                    Ok(body) => parse_field_map(&body),
                    Err(e) => {
                        warn!(error = %e, "failed to fetch contact field definitions; custom fields will not be translated");
                        FieldMap::new()
                    }
                }
            })
            .await
    }

    async fn serialize_contact(&self, contact: &Contact) -> Contact {
        serialize_custom_fields(self.field_map().await, contact)
    }

    async fn deserialize_contact(&self, contact: &Contact) -> Contact {
        deserialize_custom_fields(self.field_map().await, contact)
    }
}

fn parse_field_map(body: &Value) -> FieldMap {
    let mut map = FieldMap::new();
    let elements = body
        .get("elements")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    for field in &elements {
        let id = field.get("id").and_then(|v| v.as_str());
        let name = field.get("internalName").and_then(|v| v.as_str());
        if let (Some(id), Some(name)) = (id, name) {
            map.insert(id.to_owned(), name.to_owned());
        }
    }
    map
}

#[async_trait]
impl ContactClient for EloquaClient {
    async fn create_contact(&self, contact: &Contact) -> Result<Contact, EloquaError> {
        let wire = self.serialize_contact(contact).await;
        let created = self.api.create_contact(&Value::Object(wire)).await?;
        let created = created
            .as_object()
            .ok_or_else(|| EloquaError::MalformedResponse("contact is not an object".into()))?;
        Ok(self.deserialize_contact(created).await)
    }

    async fn delete_contact_by_email(&self, email: &str) -> Result<(), EloquaError> {
        let candidates = self.search_contacts_by_email(email).await?;
        let Some(candidate) = candidates.elements.first() else {
            return Err(EloquaError::NoContactFound {
                email: email.to_owned(),
            });
        };
        let id = candidate
            .get("id")
            .map(scalar_to_string)
            .ok_or_else(|| EloquaError::MalformedResponse("contact has no id".into()))?;
        self.api.delete_contact(&id).await
    }

    async fn search_contacts_by_email(&self, email: &str) -> Result<SearchResults, EloquaError> {
        let raw = self
            .api
            .get_contacts(&format!("email={email}"), "complete")
            .await?;
        let mut results: SearchResults = serde_json::from_value(raw)
            .map_err(|e| EloquaError::MalformedResponse(e.to_string()))?;

        // Cache population is idempotent, so the per-element conversions
        // can settle in any order.
        let converted = join_all(
            results
                .elements
                .iter()
                .map(|contact| self.deserialize_contact(contact)),
        )
        .await;
        results.elements = converted;

        Ok(results)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds an authenticated [`ContactClient`] from call-scoped gRPC
/// metadata. The dispatch service invokes this at most once per
/// connection; tests substitute their own factory.
pub trait ClientFactory: Send + Sync {
    fn authenticate(&self, metadata: &MetadataMap) -> Result<Arc<dyn ContactClient>, EloquaError>;
}

pub struct RestClientFactory {
    config: EloquaConfig,
    http: reqwest::Client,
}

impl RestClientFactory {
    pub fn new(config: EloquaConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

impl ClientFactory for RestClientFactory {
    fn authenticate(&self, metadata: &MetadataMap) -> Result<Arc<dyn ContactClient>, EloquaError> {
        let company = metadata_field(metadata, "companyname", "companyName")?;
        let username = metadata_field(metadata, "username", "username")?;
        let password = metadata_field(metadata, "password", "password")?;

        let api = EloquaRest::new(self.http.clone(), &self.config, company, username, password)?;
        Ok(Arc::new(EloquaClient::new(Arc::new(api))))
    }
}

fn metadata_field<'a>(
    metadata: &'a MetadataMap,
    key: &str,
    label: &'static str,
) -> Result<&'a str, EloquaError> {
    metadata
        .get(key)
        .and_then(|v| v.to_str().ok())
        .ok_or(EloquaError::MissingCredential(label))
}

/// Authentication fields advertised in the Cog manifest and consumed from
/// call metadata by [`RestClientFactory::authenticate`].
pub fn expected_auth_fields() -> Vec<FieldDefinition> {
    let field = |key: &str, description: &str| FieldDefinition {
        key: key.into(),
        description: description.into(),
        r#type: FieldType::String.into(),
        optionality: Optionality::Required.into(),
        ..Default::default()
    };

    vec![
        field("companyName", "Company Name"),
        field("username", "Username"),
        field("password", "Password"),
    ]
}
