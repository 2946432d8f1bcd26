use tessera_core::{AppResult, CallerIdentity};
use tessera_domain::{IamAction, PolicyDocument, validate_policy_name};

use crate::role_ports::{PutRolePolicyParams, RolePolicy, RolePolicyTarget, RoleTarget};

use super::RoleService;

impl RoleService {
    /// Attaches or replaces a permission policy on a role.
    pub(super) async fn put_role_policy(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        params: PutRolePolicyParams,
    ) -> AppResult<()> {
        validate_policy_name(params.target.policy_name.as_str())?;
        let document = PolicyDocument::parse(params.policy_document)?;

        let mut role = self.load_role(&params.target.role).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        role.set_perm_policy(params.target.policy_name, document);
        self.repository.update(&role).await
    }

    /// Reads one permission policy of a role.
    pub(super) async fn get_role_policy(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        target: RolePolicyTarget,
    ) -> AppResult<RolePolicy> {
        let role = self.load_role(&target.role).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        let policy_document = role.get_role_policy(target.policy_name.as_str())?.to_owned();
        Ok(RolePolicy {
            role_name: role.name().to_owned(),
            policy_name: target.policy_name,
            policy_document,
        })
    }

    /// Lists permission policy names attached to a role.
    pub(super) async fn list_role_policies(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        target: RoleTarget,
    ) -> AppResult<Vec<String>> {
        let role = self.load_role(&target).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        Ok(role.list_policy_names())
    }

    /// Detaches a permission policy from a role.
    pub(super) async fn delete_role_policy(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        target: RolePolicyTarget,
    ) -> AppResult<()> {
        let mut role = self.load_role(&target.role).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        role.delete_policy(target.policy_name.as_str())?;
        self.repository.update(&role).await
    }
}
