use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the structured validation detail Eloqua returns with
/// 400-class responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    #[serde(rename = "type")]
    pub kind: String,
    pub property: String,
    pub requirement: Requirement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Uniform error shape for every fault surfaced by the Eloqua client.
///
/// Raw `reqwest` faults are wrapped rather than rethrown, and 400-class
/// API responses carrying structured validation detail render one line
/// per failed requirement.
#[derive(Debug, Error)]
pub enum EloquaError {
    #[error("EloquaError: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{}", render_api_error(.status, .failures, .message))]
    Api {
        status: u16,
        failures: Vec<ValidationFailure>,
        message: String,
    },

    #[error("EloquaError: no contact found for email {email}")]
    NoContactFound { email: String },

    #[error("EloquaError: missing credential field {0}")]
    MissingCredential(&'static str),

    #[error("EloquaError: invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("EloquaError: malformed response: {0}")]
    MalformedResponse(String),
}

fn render_api_error(status: &u16, failures: &[ValidationFailure], message: &str) -> String {
    if (400..500).contains(status) && !failures.is_empty() {
        let detail = failures
            .iter()
            .map(|f| {
                format!(
                    "{} - {} did not meet requirement {}",
                    f.kind, f.property, f.requirement.kind
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("EloquaError: {detail}")
    } else {
        format!("EloquaError: {message}")
    }
}
