use thiserror::Error;

/// Faults raised by step handlers before they reach the Eloqua client,
/// typically while extracting inputs from the step payload. The dispatch
/// service converts these into ERROR outcomes.
#[derive(Debug, Error)]
pub enum CogError {
    #[error("Missing required step input: {0}")]
    MissingField(String),
    #[error("Step input {0} must be {1}")]
    InvalidField(String, &'static str),
}
