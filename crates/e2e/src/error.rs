//! Error types for the browser work unit

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npm install playwright @playwright/test")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Load(#[from] multiload_common::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl From<E2eError> for multiload_common::Error {
    fn from(e: E2eError) -> Self {
        match e {
            E2eError::Load(inner) => inner,
            other => multiload_common::Error::WorkUnit {
                unit: "web".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
