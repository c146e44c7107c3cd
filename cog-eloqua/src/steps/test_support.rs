//! Shared stub client for step handler and dispatch tests.

use crate::client::error::EloquaError;
use crate::client::fields::Contact;
use crate::client::{ContactClient, SearchResults};
use async_trait::async_trait;
use std::sync::Mutex;

/// A [`ContactClient`] whose operations resolve to pre-seeded results.
/// Seeded successes can be consumed repeatedly; seeded errors are
/// consumed by the first call.
#[derive(Default)]
pub struct StubClient {
    created: Option<Contact>,
    create_error: Mutex<Option<EloquaError>>,
    delete_ok: bool,
    delete_error: Mutex<Option<EloquaError>>,
    searched: Option<SearchResults>,
    search_error: Mutex<Option<EloquaError>>,
}

impl StubClient {
    pub fn with_created(mut self, contact: serde_json::Value) -> Self {
        self.created = Some(contact.as_object().unwrap().clone());
        self
    }

    pub fn with_create_error(self, error: EloquaError) -> Self {
        *self.create_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_delete_ok(mut self) -> Self {
        self.delete_ok = true;
        self
    }

    pub fn with_delete_error(self, error: EloquaError) -> Self {
        *self.delete_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_search(mut self, results: serde_json::Value) -> Self {
        self.searched = Some(serde_json::from_value(results).unwrap());
        self
    }

    pub fn with_search_error(self, error: EloquaError) -> Self {
        *self.search_error.lock().unwrap() = Some(error);
        self
    }
}

#[async_trait]
impl ContactClient for StubClient {
    async fn create_contact(&self, _contact: &Contact) -> Result<Contact, EloquaError> {
        if let Some(error) = self.create_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.created.clone().expect("no stubbed create result"))
    }

    async fn delete_contact_by_email(&self, _email: &str) -> Result<(), EloquaError> {
        if let Some(error) = self.delete_error.lock().unwrap().take() {
            return Err(error);
        }
        assert!(self.delete_ok, "no stubbed delete result");
        Ok(())
    }

    async fn search_contacts_by_email(&self, _email: &str) -> Result<SearchResults, EloquaError> {
        if let Some(error) = self.search_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.searched.clone().expect("no stubbed search result"))
    }
}
