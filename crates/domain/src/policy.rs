use serde_json::Value;
use tessera_core::{AppError, AppResult};

use crate::role::is_name_char;

/// Maximum permission policy name length in characters.
pub const MAX_POLICY_NAME_LEN: usize = 128;

/// Maximum policy document size in bytes.
pub const MAX_POLICY_DOCUMENT_LEN: usize = 131_072;

/// Policy document accepted for storage on a role.
///
/// The document is stored verbatim; parsing only guards its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument(String);

impl PolicyDocument {
    /// Validates that the document is a JSON object with a `Statement` member.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "policy document must not be empty".to_owned(),
            ));
        }

        if value.len() > MAX_POLICY_DOCUMENT_LEN {
            return Err(AppError::InvalidInput(format!(
                "policy document must not exceed {MAX_POLICY_DOCUMENT_LEN} bytes"
            )));
        }

        let parsed: Value = serde_json::from_str(value.as_str()).map_err(|error| {
            AppError::InvalidInput(format!("malformed policy document: {error}"))
        })?;

        let Some(object) = parsed.as_object() else {
            return Err(AppError::InvalidInput(
                "malformed policy document: expected a JSON object".to_owned(),
            ));
        };

        if !object.contains_key("Statement") {
            return Err(AppError::InvalidInput(
                "malformed policy document: missing 'Statement'".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PolicyDocument> for String {
    fn from(value: PolicyDocument) -> Self {
        value.0
    }
}

/// Validates a permission policy name.
pub fn validate_policy_name(policy_name: &str) -> AppResult<()> {
    let len = policy_name.chars().count();
    if len == 0 || len > MAX_POLICY_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "policy name must be between 1 and {MAX_POLICY_NAME_LEN} characters"
        )));
    }

    if let Some(invalid) = policy_name.chars().find(|value| !is_name_char(*value)) {
        return Err(AppError::InvalidInput(format!(
            "policy name '{policy_name}' contains invalid character '{invalid}'"
        )));
    }

    Ok(())
}
