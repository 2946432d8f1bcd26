use tessera_core::{AppResult, CallerIdentity};
use tessera_domain::Role;

use crate::AuthorizationService;
use crate::role_ports::{RoleOperation, RoleOperationKind, RoleOutcome, RoleParams, RoleTarget};
use crate::role_repository::RoleRepository;

mod policies;
mod roles;

/// Application service implementing the role operation protocol.
///
/// Every operation checks the caller capability first, then asks the policy
/// engine, and only then touches role state.
#[derive(Clone)]
pub struct RoleService {
    repository: RoleRepository,
    authorization: AuthorizationService,
}

impl RoleService {
    /// Creates a new role service.
    #[must_use]
    pub fn new(repository: RoleRepository, authorization: AuthorizationService) -> Self {
        Self {
            repository,
            authorization,
        }
    }

    /// Extracts the operation from a parameter bag and runs it.
    pub async fn execute(
        &self,
        caller: &CallerIdentity,
        kind: RoleOperationKind,
        params: &RoleParams,
    ) -> AppResult<RoleOutcome> {
        let operation = RoleOperation::from_params(kind, params, caller.tenant())?;
        self.dispatch(caller, operation).await
    }

    /// Runs one extracted operation to its single outcome.
    ///
    /// The capability level and IAM action both come from the operation kind.
    pub async fn dispatch(
        &self,
        caller: &CallerIdentity,
        operation: RoleOperation,
    ) -> AppResult<RoleOutcome> {
        let kind = operation.kind();
        self.authorization
            .require_capability(caller, kind.required_capability())
            .await?;
        let action = kind.iam_action();

        match operation {
            RoleOperation::CreateRole(params) => self
                .create_role(caller, action, params)
                .await
                .map(RoleOutcome::Created),
            RoleOperation::DeleteRole(target) => self
                .delete_role(caller, action, target)
                .await
                .map(|()| RoleOutcome::Deleted),
            RoleOperation::GetRole(target) => self
                .get_role(caller, action, target)
                .await
                .map(RoleOutcome::Role),
            RoleOperation::ModifyRole(params) => self
                .modify_role(caller, action, params)
                .await
                .map(|()| RoleOutcome::Modified),
            RoleOperation::ListRoles(params) => self
                .list_roles(caller, action, params)
                .await
                .map(RoleOutcome::Roles),
            RoleOperation::PutRolePolicy(params) => self
                .put_role_policy(caller, action, params)
                .await
                .map(|()| RoleOutcome::PolicyPut),
            RoleOperation::GetRolePolicy(target) => self
                .get_role_policy(caller, action, target)
                .await
                .map(RoleOutcome::Policy),
            RoleOperation::ListRolePolicies(target) => self
                .list_role_policies(caller, action, target)
                .await
                .map(RoleOutcome::PolicyNames),
            RoleOperation::DeleteRolePolicy(target) => self
                .delete_role_policy(caller, action, target)
                .await
                .map(|()| RoleOutcome::PolicyDeleted),
        }
    }

    async fn load_role(&self, target: &RoleTarget) -> AppResult<Role> {
        let placeholder = target.placeholder()?;
        self.repository
            .get(placeholder.tenant(), placeholder.name())
            .await
    }
}

#[cfg(test)]
mod tests;
