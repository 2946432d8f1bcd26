use tessera_core::{AppResult, CallerIdentity};
use tessera_domain::{IamAction, PolicyDocument, Role, role_arn};

use crate::role_ports::{
    CreateRoleParams, GetRoleTarget, ListRolesParams, ModifyRoleParams, RoleListing, RoleTarget,
};

use super::RoleService;

impl RoleService {
    /// Creates a role with an exclusive write of all three indices.
    pub(super) async fn create_role(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        params: CreateRoleParams,
    ) -> AppResult<Role> {
        let trust_policy = PolicyDocument::parse(params.trust_policy)?;
        let mut role = Role::new(
            params.role_name,
            params.tenant,
            params.path,
            trust_policy,
            params.max_session_duration.as_deref(),
        )?;
        role.validate()?;

        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        self.repository.create(&mut role, true).await?;
        Ok(role)
    }

    /// Deletes a role that has no permission policies attached.
    pub(super) async fn delete_role(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        target: RoleTarget,
    ) -> AppResult<()> {
        let role = self.load_role(&target).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        self.repository.delete(&role).await
    }

    /// Reads a role by name or id.
    ///
    /// Permission is checked again against the resolved role, whose path
    /// may differ from the nominal one a name lookup assumes.
    pub(super) async fn get_role(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        target: GetRoleTarget,
    ) -> AppResult<Role> {
        let role = match target {
            GetRoleTarget::ByName(target) => {
                target.placeholder()?;
                self.authorization
                    .require_permission(caller, action, target.nominal_arn().as_str())
                    .await?;
                self.load_role(&target).await?
            }
            GetRoleTarget::ById(id) => self.repository.get_by_id(id.as_str()).await?,
        };

        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        Ok(role)
    }

    /// Replaces the trust policy of a role.
    pub(super) async fn modify_role(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        params: ModifyRoleParams,
    ) -> AppResult<()> {
        let trust_policy = PolicyDocument::parse(params.trust_policy)?;
        let mut role = self.load_role(&params.target).await?;
        self.authorization
            .require_permission(caller, action, role.arn())
            .await?;

        role.update_trust_policy(trust_policy);
        self.repository.update(&role).await
    }

    /// Lists roles of a tenant under a path prefix.
    pub(super) async fn list_roles(
        &self,
        caller: &CallerIdentity,
        action: IamAction,
        params: ListRolesParams,
    ) -> AppResult<RoleListing> {
        let resource = format!(
            "{}*",
            role_arn(&params.tenant, params.path_prefix.as_str(), "")
        );
        self.authorization
            .require_permission(caller, action, resource.as_str())
            .await?;

        self.repository
            .list(
                &params.tenant,
                params.path_prefix.as_str(),
                params.marker.as_deref(),
                params.max_items,
            )
            .await
    }
}
