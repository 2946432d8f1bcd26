use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_application::{RoleListing, RoleOperationKind, RoleOutcome, RoleParams, RolePolicy};
use tessera_core::AppError;
use tessera_domain::Role;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub role_store: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Incoming IAM action request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamRequest {
    pub action: String,
    pub role_name: Option<String>,
    pub role_id: Option<String>,
    pub tenant: Option<String>,
    pub path: Option<String>,
    pub assume_role_policy_document: Option<String>,
    pub policy_name: Option<String>,
    pub policy_document: Option<String>,
    pub path_prefix: Option<String>,
    pub max_session_duration: Option<Value>,
    pub marker: Option<String>,
    pub max_items: Option<u32>,
}

impl IamRequest {
    /// Splits the request into its operation kind and parameter bag.
    pub fn into_operation(self) -> Result<(RoleOperationKind, RoleParams), AppError> {
        let kind = RoleOperationKind::from_action_name(self.action.as_str())?;

        let max_session_duration = match self.max_session_duration {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value),
            Some(Value::Number(value)) => Some(value.to_string()),
            Some(other) => {
                return Err(AppError::InvalidInput(format!(
                    "MaxSessionDuration must be a number of seconds, got '{other}'"
                )));
            }
        };

        // UpdateAssumeRolePolicy carries the new trust policy as PolicyDocument.
        let (trust_policy, policy_document) = match kind {
            RoleOperationKind::ModifyRole => (
                self.assume_role_policy_document.or(self.policy_document),
                None,
            ),
            _ => (self.assume_role_policy_document, self.policy_document),
        };

        Ok((
            kind,
            RoleParams {
                role_name: self.role_name,
                role_id: self.role_id,
                tenant: self.tenant,
                path: self.path,
                trust_policy,
                policy_name: self.policy_name,
                policy_document,
                path_prefix: self.path_prefix,
                max_session_duration,
                marker: self.marker,
                max_items: self.max_items,
            },
        ))
    }
}

/// API representation of a role.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleResponse {
    pub role_id: String,
    pub role_name: String,
    pub path: String,
    pub arn: String,
    pub create_date: String,
    pub max_session_duration: u64,
    pub assume_role_policy_document: String,
}

impl From<&Role> for RoleResponse {
    fn from(value: &Role) -> Self {
        Self {
            role_id: value.id().to_owned(),
            role_name: value.name().to_owned(),
            path: value.path().to_owned(),
            arn: value.arn().to_owned(),
            create_date: value.creation_date().to_owned(),
            max_session_duration: value.max_session_duration(),
            assume_role_policy_document: value.trust_policy().to_owned(),
        }
    }
}

/// Response wrapping a single role.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleEnvelopeResponse {
    pub role: RoleResponse,
}

/// Response for role listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRolesResponse {
    pub roles: Vec<RoleResponse>,
    pub is_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl From<RoleListing> for ListRolesResponse {
    fn from(value: RoleListing) -> Self {
        Self {
            roles: value.roles.iter().map(RoleResponse::from).collect(),
            is_truncated: value.is_truncated,
            marker: value.marker,
        }
    }
}

/// Response for one permission policy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RolePolicyResponse {
    pub role_name: String,
    pub policy_name: String,
    pub policy_document: String,
}

impl From<RolePolicy> for RolePolicyResponse {
    fn from(value: RolePolicy) -> Self {
        Self {
            role_name: value.role_name,
            policy_name: value.policy_name,
            policy_document: value.policy_document,
        }
    }
}

/// Response for permission policy name listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRolePoliciesResponse {
    pub policy_names: Vec<String>,
}

/// Response for operations without a payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionCompletedResponse {
    pub action: &'static str,
}

/// Any IAM action response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IamResponse {
    Role(RoleEnvelopeResponse),
    Roles(ListRolesResponse),
    Policy(RolePolicyResponse),
    PolicyNames(ListRolePoliciesResponse),
    Completed(ActionCompletedResponse),
}

impl IamResponse {
    /// Renders the outcome of `kind`.
    pub fn from_outcome(kind: RoleOperationKind, outcome: RoleOutcome) -> Self {
        match outcome {
            RoleOutcome::Created(role) | RoleOutcome::Role(role) => {
                Self::Role(RoleEnvelopeResponse {
                    role: RoleResponse::from(&role),
                })
            }
            RoleOutcome::Roles(listing) => Self::Roles(ListRolesResponse::from(listing)),
            RoleOutcome::Policy(policy) => Self::Policy(RolePolicyResponse::from(policy)),
            RoleOutcome::PolicyNames(policy_names) => {
                Self::PolicyNames(ListRolePoliciesResponse { policy_names })
            }
            RoleOutcome::Deleted
            | RoleOutcome::Modified
            | RoleOutcome::PolicyPut
            | RoleOutcome::PolicyDeleted => Self::Completed(ActionCompletedResponse {
                action: kind.action_name(),
            }),
        }
    }
}
