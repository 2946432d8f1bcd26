use tessera_core::{AppError, AppResult, TenantName};
use tessera_domain::{
    CapabilityLevel, DEFAULT_ROLE_PATH, IamAction, Role, extract_name_tenant, role_arn,
};

/// Default page size for role listings.
pub const DEFAULT_LIST_MAX_ITEMS: usize = 100;

/// Largest page size accepted for role listings.
pub const MAX_LIST_MAX_ITEMS: usize = 1000;

/// Parameter bag accepted from the transport layer for every role operation.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleParams {
    /// Role name, optionally `tenant$name`.
    pub role_name: Option<String>,
    /// Role id, for lookups by id.
    pub role_id: Option<String>,
    /// Tenant override; defaults to the caller tenant.
    pub tenant: Option<String>,
    /// Role path for creation.
    pub path: Option<String>,
    /// Trust (assume role) policy document.
    pub trust_policy: Option<String>,
    /// Permission policy name.
    pub policy_name: Option<String>,
    /// Permission policy document.
    pub policy_document: Option<String>,
    /// Path prefix for listings.
    pub path_prefix: Option<String>,
    /// Maximum session duration in seconds, as received.
    pub max_session_duration: Option<String>,
    /// Continuation marker returned by a truncated listing.
    pub marker: Option<String>,
    /// Maximum roles per listing page.
    pub max_items: Option<u32>,
}

/// Operation kinds exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleOperationKind {
    /// Creates a role.
    CreateRole,
    /// Deletes a role.
    DeleteRole,
    /// Reads a role.
    GetRole,
    /// Replaces the trust policy of a role.
    ModifyRole,
    /// Lists roles under a path prefix.
    ListRoles,
    /// Attaches or replaces a permission policy.
    PutRolePolicy,
    /// Reads a permission policy.
    GetRolePolicy,
    /// Lists permission policy names.
    ListRolePolicies,
    /// Detaches a permission policy.
    DeleteRolePolicy,
}

impl RoleOperationKind {
    /// Returns all operation kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleOperationKind] = &[
            RoleOperationKind::CreateRole,
            RoleOperationKind::DeleteRole,
            RoleOperationKind::GetRole,
            RoleOperationKind::ModifyRole,
            RoleOperationKind::ListRoles,
            RoleOperationKind::PutRolePolicy,
            RoleOperationKind::GetRolePolicy,
            RoleOperationKind::ListRolePolicies,
            RoleOperationKind::DeleteRolePolicy,
        ];

        ALL
    }

    /// Returns the transport action name.
    #[must_use]
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::CreateRole => "CreateRole",
            Self::DeleteRole => "DeleteRole",
            Self::GetRole => "GetRole",
            Self::ModifyRole => "UpdateAssumeRolePolicy",
            Self::ListRoles => "ListRoles",
            Self::PutRolePolicy => "PutRolePolicy",
            Self::GetRolePolicy => "GetRolePolicy",
            Self::ListRolePolicies => "ListRolePolicies",
            Self::DeleteRolePolicy => "DeleteRolePolicy",
        }
    }

    /// Parses a transport action name. `ModifyRole` is accepted as an alias.
    pub fn from_action_name(value: &str) -> AppResult<Self> {
        if value == "ModifyRole" {
            return Ok(Self::ModifyRole);
        }

        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.action_name() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown role action '{value}'")))
    }

    /// Returns the capability level the caller must hold.
    #[must_use]
    pub fn required_capability(&self) -> CapabilityLevel {
        match self {
            Self::GetRole | Self::ListRoles | Self::GetRolePolicy | Self::ListRolePolicies => {
                CapabilityLevel::Read
            }
            Self::CreateRole
            | Self::DeleteRole
            | Self::ModifyRole
            | Self::PutRolePolicy
            | Self::DeleteRolePolicy => CapabilityLevel::Write,
        }
    }

    /// Returns the IAM action checked by the policy engine.
    #[must_use]
    pub fn iam_action(&self) -> IamAction {
        match self {
            Self::CreateRole => IamAction::CreateRole,
            Self::DeleteRole => IamAction::DeleteRole,
            Self::GetRole => IamAction::GetRole,
            Self::ModifyRole => IamAction::UpdateAssumeRolePolicy,
            Self::ListRoles => IamAction::ListRoles,
            Self::PutRolePolicy => IamAction::PutRolePolicy,
            Self::GetRolePolicy => IamAction::GetRolePolicy,
            Self::ListRolePolicies => IamAction::ListRolePolicies,
            Self::DeleteRolePolicy => IamAction::DeleteRolePolicy,
        }
    }
}

/// Role addressed by `(tenant, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTarget {
    /// Role tenant.
    pub tenant: TenantName,
    /// Role name without tenant.
    pub name: String,
}

impl RoleTarget {
    /// Resolves a possibly tenant-qualified name against a default tenant.
    pub fn new(name: &str, tenant: TenantName) -> AppResult<Self> {
        let (tenant, name) = extract_name_tenant(name.to_owned(), tenant)?;
        Ok(Self { tenant, name })
    }

    /// Builds a validated lookup placeholder for this target.
    pub fn placeholder(&self) -> AppResult<Role> {
        let role = Role::new(self.name.as_str(), self.tenant.clone(), "", "", None)?;
        role.validate()?;
        Ok(role)
    }

    /// Returns the ARN the target would have under the default path.
    #[must_use]
    pub fn nominal_arn(&self) -> String {
        role_arn(&self.tenant, DEFAULT_ROLE_PATH, self.name.as_str())
    }
}

/// Role addressed by name or by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetRoleTarget {
    /// Lookup through the name index.
    ByName(RoleTarget),
    /// Lookup through the info index.
    ById(String),
}

/// Permission policy addressed on a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicyTarget {
    /// Role carrying the policy.
    pub role: RoleTarget,
    /// Permission policy name.
    pub policy_name: String,
}

/// Parameters for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleParams {
    /// Tenant the role is created in, unless the name is tenant-qualified.
    pub tenant: TenantName,
    /// Role name, optionally `tenant$name`.
    pub role_name: String,
    /// Role path; empty means `/`.
    pub path: String,
    /// Trust policy document.
    pub trust_policy: String,
    /// Maximum session duration, as received.
    pub max_session_duration: Option<String>,
}

/// Parameters for trust policy replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRoleParams {
    /// Role to modify.
    pub target: RoleTarget,
    /// New trust policy document.
    pub trust_policy: String,
}

/// Parameters for role listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRolesParams {
    /// Tenant to list.
    pub tenant: TenantName,
    /// Path prefix; `/` lists every role.
    pub path_prefix: String,
    /// Continuation marker from a previous page.
    pub marker: Option<String>,
    /// Page size.
    pub max_items: usize,
}

/// Parameters for attaching a permission policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRolePolicyParams {
    /// Role and policy name.
    pub target: RolePolicyTarget,
    /// Permission policy document.
    pub policy_document: String,
}

/// One fully extracted role operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOperation {
    /// Creates a role.
    CreateRole(CreateRoleParams),
    /// Deletes a role.
    DeleteRole(RoleTarget),
    /// Reads a role.
    GetRole(GetRoleTarget),
    /// Replaces the trust policy of a role.
    ModifyRole(ModifyRoleParams),
    /// Lists roles under a path prefix.
    ListRoles(ListRolesParams),
    /// Attaches or replaces a permission policy.
    PutRolePolicy(PutRolePolicyParams),
    /// Reads a permission policy.
    GetRolePolicy(RolePolicyTarget),
    /// Lists permission policy names.
    ListRolePolicies(RoleTarget),
    /// Detaches a permission policy.
    DeleteRolePolicy(RolePolicyTarget),
}

impl RoleOperation {
    /// Extracts the parameters `kind` requires from the bag.
    ///
    /// Roles live in `default_tenant` unless the bag or the role name names
    /// another tenant.
    pub fn from_params(
        kind: RoleOperationKind,
        params: &RoleParams,
        default_tenant: &TenantName,
    ) -> AppResult<Self> {
        let tenant = match present(&params.tenant) {
            Some(value) => TenantName::new(value)?,
            None => default_tenant.clone(),
        };

        let operation = match kind {
            RoleOperationKind::CreateRole => Self::CreateRole(CreateRoleParams {
                tenant,
                role_name: required(&params.role_name, "RoleName")?.to_owned(),
                path: present(&params.path).unwrap_or_default().to_owned(),
                trust_policy: required(&params.trust_policy, "AssumeRolePolicyDocument")?
                    .to_owned(),
                max_session_duration: present(&params.max_session_duration).map(str::to_owned),
            }),
            RoleOperationKind::DeleteRole => Self::DeleteRole(role_target(params, tenant)?),
            RoleOperationKind::GetRole => match present(&params.role_name) {
                Some(name) => Self::GetRole(GetRoleTarget::ByName(RoleTarget::new(name, tenant)?)),
                None => match present(&params.role_id) {
                    Some(id) => Self::GetRole(GetRoleTarget::ById(id.to_owned())),
                    None => return Err(missing("RoleName")),
                },
            },
            RoleOperationKind::ModifyRole => Self::ModifyRole(ModifyRoleParams {
                target: role_target(params, tenant)?,
                trust_policy: required(&params.trust_policy, "PolicyDocument")?.to_owned(),
            }),
            RoleOperationKind::ListRoles => {
                let path_prefix = present(&params.path_prefix)
                    .unwrap_or(DEFAULT_ROLE_PATH)
                    .to_owned();
                if !path_prefix.starts_with('/') {
                    return Err(AppError::InvalidInput(format!(
                        "path prefix '{path_prefix}' must start with '/'"
                    )));
                }

                let max_items = match params.max_items {
                    None => DEFAULT_LIST_MAX_ITEMS,
                    Some(value) => usize::try_from(value)
                        .ok()
                        .filter(|value| (1..=MAX_LIST_MAX_ITEMS).contains(value))
                        .ok_or_else(|| {
                            AppError::InvalidInput(format!(
                                "max items must be between 1 and {MAX_LIST_MAX_ITEMS}"
                            ))
                        })?,
                };

                Self::ListRoles(ListRolesParams {
                    tenant,
                    path_prefix,
                    marker: present(&params.marker).map(str::to_owned),
                    max_items,
                })
            }
            RoleOperationKind::PutRolePolicy => Self::PutRolePolicy(PutRolePolicyParams {
                target: role_policy_target(params, tenant)?,
                policy_document: required(&params.policy_document, "PolicyDocument")?.to_owned(),
            }),
            RoleOperationKind::GetRolePolicy => {
                Self::GetRolePolicy(role_policy_target(params, tenant)?)
            }
            RoleOperationKind::ListRolePolicies => {
                Self::ListRolePolicies(role_target(params, tenant)?)
            }
            RoleOperationKind::DeleteRolePolicy => {
                Self::DeleteRolePolicy(role_policy_target(params, tenant)?)
            }
        };

        Ok(operation)
    }

    /// Returns the kind of this operation.
    #[must_use]
    pub fn kind(&self) -> RoleOperationKind {
        match self {
            Self::CreateRole(_) => RoleOperationKind::CreateRole,
            Self::DeleteRole(_) => RoleOperationKind::DeleteRole,
            Self::GetRole(_) => RoleOperationKind::GetRole,
            Self::ModifyRole(_) => RoleOperationKind::ModifyRole,
            Self::ListRoles(_) => RoleOperationKind::ListRoles,
            Self::PutRolePolicy(_) => RoleOperationKind::PutRolePolicy,
            Self::GetRolePolicy(_) => RoleOperationKind::GetRolePolicy,
            Self::ListRolePolicies(_) => RoleOperationKind::ListRolePolicies,
            Self::DeleteRolePolicy(_) => RoleOperationKind::DeleteRolePolicy,
        }
    }
}

/// One page of a role listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleListing {
    /// Roles ordered by path, then name.
    pub roles: Vec<Role>,
    /// Whether more roles follow.
    pub is_truncated: bool,
    /// Marker to pass for the next page, when truncated.
    pub marker: Option<String>,
}

/// Permission policy attached to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    /// Role name.
    pub role_name: String,
    /// Policy name.
    pub policy_name: String,
    /// Policy document.
    pub policy_document: String,
}

/// Terminal outcome of a successful role operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOutcome {
    /// Role created.
    Created(Role),
    /// Role deleted.
    Deleted,
    /// Role read.
    Role(Role),
    /// Trust policy replaced.
    Modified,
    /// Role listing page.
    Roles(RoleListing),
    /// Permission policy attached.
    PolicyPut,
    /// Permission policy read.
    Policy(RolePolicy),
    /// Permission policy names.
    PolicyNames(Vec<String>),
    /// Permission policy detached.
    PolicyDeleted,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
    present(value).ok_or_else(|| missing(name))
}

fn missing(name: &str) -> AppError {
    AppError::InvalidInput(format!("missing required parameter '{name}'"))
}

fn role_target(params: &RoleParams, tenant: TenantName) -> AppResult<RoleTarget> {
    RoleTarget::new(required(&params.role_name, "RoleName")?, tenant)
}

fn role_policy_target(params: &RoleParams, tenant: TenantName) -> AppResult<RolePolicyTarget> {
    Ok(RolePolicyTarget {
        role: role_target(params, tenant)?,
        policy_name: required(&params.policy_name, "PolicyName")?.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use tessera_core::{AppError, TenantName};
    use tessera_domain::CapabilityLevel;

    use super::{GetRoleTarget, RoleOperation, RoleOperationKind, RoleParams};

    #[test]
    fn action_names_roundtrip() {
        for kind in RoleOperationKind::all() {
            assert_eq!(
                RoleOperationKind::from_action_name(kind.action_name()),
                Ok(*kind)
            );
        }
        assert_eq!(
            RoleOperationKind::from_action_name("ModifyRole"),
            Ok(RoleOperationKind::ModifyRole)
        );
    }

    #[test]
    fn mutating_operations_require_write() {
        for kind in [
            RoleOperationKind::CreateRole,
            RoleOperationKind::DeleteRole,
            RoleOperationKind::ModifyRole,
            RoleOperationKind::PutRolePolicy,
            RoleOperationKind::DeleteRolePolicy,
        ] {
            assert_eq!(kind.required_capability(), CapabilityLevel::Write);
        }
        assert_eq!(
            RoleOperationKind::ListRolePolicies.required_capability(),
            CapabilityLevel::Read
        );
    }

    #[test]
    fn create_requires_trust_policy() {
        let params = RoleParams {
            role_name: Some("deployer".to_owned()),
            trust_policy: Some(String::new()),
            ..RoleParams::default()
        };

        let result =
            RoleOperation::from_params(RoleOperationKind::CreateRole, &params, &TenantName::global());
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn get_role_falls_back_to_id() {
        let params = RoleParams {
            role_id: Some("id-1".to_owned()),
            ..RoleParams::default()
        };

        let result =
            RoleOperation::from_params(RoleOperationKind::GetRole, &params, &TenantName::global());
        assert_eq!(
            result,
            Ok(RoleOperation::GetRole(GetRoleTarget::ById("id-1".to_owned())))
        );
    }

    #[test]
    fn qualified_name_overrides_caller_tenant() {
        let params = RoleParams {
            role_name: Some("ops$backup".to_owned()),
            ..RoleParams::default()
        };
        let tenant = TenantName::new("acme").unwrap_or_default();

        let result = RoleOperation::from_params(RoleOperationKind::DeleteRole, &params, &tenant);
        let Ok(RoleOperation::DeleteRole(target)) = result else {
            unreachable!();
        };
        assert_eq!(target.tenant.as_str(), "ops");
        assert_eq!(target.name, "backup");
    }

    #[test]
    fn list_rejects_out_of_range_page_size() {
        let params = RoleParams {
            max_items: Some(0),
            ..RoleParams::default()
        };

        let result =
            RoleOperation::from_params(RoleOperationKind::ListRoles, &params, &TenantName::global());
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
