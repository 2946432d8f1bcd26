use std::sync::Arc;

use tracing::warn;

use tessera_core::{AppError, AppResult, CallerIdentity};
use tessera_domain::{CapabilityLevel, IamAction, PolicyDecision};

use crate::role_ports::{CapabilityProvider, PolicyEngine};

/// Application service running the two authorization stages of role operations.
#[derive(Clone)]
pub struct AuthorizationService {
    capabilities: Arc<dyn CapabilityProvider>,
    policy_engine: Arc<dyn PolicyEngine>,
}

impl AuthorizationService {
    /// Creates a new authorization service from its collaborators.
    #[must_use]
    pub fn new(
        capabilities: Arc<dyn CapabilityProvider>,
        policy_engine: Arc<dyn PolicyEngine>,
    ) -> Self {
        Self {
            capabilities,
            policy_engine,
        }
    }

    /// Ensures the caller holds the coarse capability `level` on roles.
    pub async fn require_capability(
        &self,
        caller: &CallerIdentity,
        level: CapabilityLevel,
    ) -> AppResult<()> {
        if self.capabilities.has_capability(caller, level).await? {
            return Ok(());
        }

        warn!(
            subject = %caller.subject(),
            tenant = %caller.tenant(),
            capability = level.as_str(),
            "role capability check denied"
        );
        Err(AppError::AccessDenied(format!(
            "subject '{}' is missing roles={} capability",
            caller.subject(),
            level.as_str()
        )))
    }

    /// Ensures the policy engine allows `action` on `resource_arn`.
    pub async fn require_permission(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        resource_arn: &str,
    ) -> AppResult<()> {
        match self
            .policy_engine
            .evaluate(caller, action, resource_arn)
            .await?
        {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny => {
                warn!(
                    subject = %caller.subject(),
                    action = action.as_str(),
                    resource = resource_arn,
                    "role permission check denied"
                );
                Err(AppError::AccessDenied(format!(
                    "subject '{}' is not allowed to perform '{}' on '{resource_arn}'",
                    caller.subject(),
                    action.as_str()
                )))
            }
        }
    }
}
