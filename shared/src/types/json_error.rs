use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Standard error response structure
///
/// `attribute` is only present for validation failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
            attribute: None,
        }
    }

    pub fn invalid_attribute(err: &ValidationError) -> Self {
        Self {
            attribute: Some(err.attribute.clone()),
            ..Self::new("INVALID_ATTRIBUTE", &err.to_string())
        }
    }
}
