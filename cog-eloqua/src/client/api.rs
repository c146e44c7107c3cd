//! Raw Eloqua REST surface.
//!
//! [`EloquaApi`] is the seam between the client wrapper and the actual
//! HTTP calls; [`EloquaRest`] is the production implementation. Paths and
//! query parameters match the Eloqua REST 1.0 contact surface.

use crate::client::error::{EloquaError, ValidationFailure};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

const CONTACT_PATH: &str = "/api/REST/1.0/data/contact";
const CONTACTS_PATH: &str = "/api/REST/1.0/data/contacts";
const CONTACT_FIELDS_PATH: &str = "/api/REST/1.0/assets/contact/fields";

#[async_trait]
pub trait EloquaApi: Send + Sync {
    async fn create_contact(&self, body: &Value) -> Result<Value, EloquaError>;
    async fn delete_contact(&self, id: &str) -> Result<(), EloquaError>;
    async fn get_contacts(&self, search: &str, depth: &str) -> Result<Value, EloquaError>;
    async fn get_contact_fields(&self, depth: &str) -> Result<Value, EloquaError>;
}

/// Eloqua endpoint and shared HTTP client, independent of any one set of
/// credentials.
#[derive(Debug, Clone)]
pub struct EloquaConfig {
    pub base_url: Url,
}

pub struct EloquaRest {
    client: reqwest::Client,
    base_url: Url,
    company: String,
    username: String,
    password: String,
}

impl EloquaRest {
    /// Builds an authenticated REST client. Fails fast on structurally
    /// invalid credentials; the credentials themselves are only verified
    /// by Eloqua on the first real call.
    pub fn new(
        client: reqwest::Client,
        config: &EloquaConfig,
        company: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, EloquaError> {
        if company.is_empty() {
            return Err(EloquaError::MissingCredential("companyName"));
        }
        if username.is_empty() {
            return Err(EloquaError::MissingCredential("username"));
        }
        if password.is_empty() {
            return Err(EloquaError::MissingCredential("password"));
        }

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            company: company.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EloquaError> {
        self.base_url
            .join(path)
            .map_err(|e| EloquaError::InvalidEndpoint(e.to_string()))
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, EloquaError> {
        // Eloqua basic auth expects the username in "company\user" form.
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(
                format!("{}\\{}", self.company, self.username),
                Some(&self.password),
            )
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, body));
        }
        if body.trim().is_empty() {
            // Delete responses have no body.
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| EloquaError::MalformedResponse(e.to_string()))
    }
}

fn api_error(status: StatusCode, body: String) -> EloquaError {
    // 400-class responses carry an array of validation failures.
    let failures: Vec<ValidationFailure> = serde_json::from_str(&body).unwrap_or_default();
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };
    EloquaError::Api {
        status: status.as_u16(),
        failures,
        message,
    }
}

#[async_trait]
impl EloquaApi for EloquaRest {
    async fn create_contact(&self, body: &Value) -> Result<Value, EloquaError> {
        let url = self.endpoint(CONTACT_PATH)?;
        self.request(Method::POST, url, &[], Some(body)).await
    }

    async fn delete_contact(&self, id: &str) -> Result<(), EloquaError> {
        let url = self.endpoint(&format!("{CONTACT_PATH}/{id}"))?;
        self.request(Method::DELETE, url, &[], None).await?;
        Ok(())
    }

    async fn get_contacts(&self, search: &str, depth: &str) -> Result<Value, EloquaError> {
        let url = self.endpoint(CONTACTS_PATH)?;
        self.request(Method::GET, url, &[("depth", depth), ("search", search)], None)
            .await
    }

    async fn get_contact_fields(&self, depth: &str) -> Result<Value, EloquaError> {
        let url = self.endpoint(CONTACT_FIELDS_PATH)?;
        self.request(Method::GET, url, &[("depth", depth)], None)
            .await
    }
}
