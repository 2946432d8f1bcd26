use serde::{Deserialize, Serialize};

use crate::TenantName;

/// Authenticated caller resolved by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    subject: String,
    tenant: TenantName,
}

impl CallerIdentity {
    /// Creates a caller identity from an authenticated subject and its tenant.
    #[must_use]
    pub fn new(subject: impl Into<String>, tenant: TenantName) -> Self {
        Self {
            subject: subject.into(),
            tenant,
        }
    }

    /// Returns the stable subject (user id) of the caller.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the tenant the caller belongs to.
    #[must_use]
    pub fn tenant(&self) -> &TenantName {
        &self.tenant
    }

    /// Returns the principal ARN used in policy evaluation.
    #[must_use]
    pub fn principal_arn(&self) -> String {
        format!("arn:aws:iam::{}:user/{}", self.tenant, self.subject)
    }
}
