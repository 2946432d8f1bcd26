use async_trait::async_trait;

use tessera_core::{AppResult, CallerIdentity};
use tessera_domain::{CapabilityLevel, IamAction, PolicyDecision};

/// Port resolving the coarse capability levels granted to callers.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Returns whether the caller holds `level` on roles.
    async fn has_capability(
        &self,
        caller: &CallerIdentity,
        level: CapabilityLevel,
    ) -> AppResult<bool>;
}

/// Port evaluating fine-grained, resource-aware permissions.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// Evaluates whether the caller may perform `action` on `resource_arn`.
    async fn evaluate(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        resource_arn: &str,
    ) -> AppResult<PolicyDecision>;
}
