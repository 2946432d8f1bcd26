//! Shared primitives for all Rust crates in Tessera.

#![forbid(unsafe_code)]

/// Caller identity primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::CallerIdentity;

/// Result type used across Tessera crates.
pub type AppResult<T> = Result<T, AppError>;

/// Separator between tenant and name in combined `tenant$name` inputs.
pub const TENANT_DELIMITER: char = '$';

/// Tenant namespace that partitions every persisted role.
///
/// The empty tenant is the default (global) namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TenantName(String);

impl TenantName {
    /// Creates a tenant name, rejecting the tenant delimiter.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.contains(TENANT_DELIMITER) {
            return Err(AppError::InvalidInput(format!(
                "tenant '{value}' must not contain '{TENANT_DELIMITER}'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the default (empty) tenant.
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this is the default (empty) tenant.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for TenantName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Malformed name, path, duration or policy input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Caller lacks the capability or the policy engine denied the action.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Exclusive create collided with an existing record.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Requested role or store record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Requested permission policy is not attached to the role.
    #[error("policy not found: {0}")]
    PolicyNotFound(String),

    /// Role still has permission policies attached.
    #[error("delete conflict: {0}")]
    DeleteConflict(String),

    /// Underlying store could not be reached or failed an I/O call.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Request carries no resolvable caller credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the IAM error code reported to transport callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "InvalidInput",
            Self::AccessDenied(_) => "AccessDenied",
            Self::AlreadyExists(_) => "EntityAlreadyExists",
            Self::NotFound(_) | Self::PolicyNotFound(_) => "NoSuchEntity",
            Self::DeleteConflict(_) => "DeleteConflict",
            Self::StoreUnavailable(_) => "ServiceUnavailable",
            Self::Unauthorized(_) => "InvalidClientTokenId",
            Self::Internal(_) => "ServiceFailure",
        }
    }
}
