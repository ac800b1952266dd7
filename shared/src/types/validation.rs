use thiserror::Error;

/// A request body field that failed a domain rule.
///
/// `attribute` is the JSON path of the offending field, e.g. `name` or
/// `products[1].quantity`, so clients can point at the exact input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{attribute}: {message}")]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

pub(crate) fn require_non_empty(attribute: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(attribute, "must not be empty"));
    }
    Ok(())
}
