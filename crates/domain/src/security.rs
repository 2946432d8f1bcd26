use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::AppError;

/// Coarse capability level required by role operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityLevel {
    /// Allows reading roles and their policies.
    Read,
    /// Allows creating, modifying and deleting roles and their policies.
    Write,
}

impl CapabilityLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Capability levels granted to a caller over the `roles` resource.
///
/// Parsed from `roles=read`, `roles=write`, `roles=read,write` or `roles=*`.
/// Write does not imply read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet {
    read: bool,
    write: bool,
}

impl CapabilitySet {
    /// Returns a set granting every level.
    #[must_use]
    pub fn all() -> Self {
        Self {
            read: true,
            write: true,
        }
    }

    /// Returns whether the set grants `level`.
    #[must_use]
    pub fn allows(&self, level: CapabilityLevel) -> bool {
        match level {
            CapabilityLevel::Read => self.read,
            CapabilityLevel::Write => self.write,
        }
    }
}

impl FromStr for CapabilitySet {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut capabilities = Self::default();

        for entry in value.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
            let Some((resource, levels)) = entry.split_once('=') else {
                return Err(AppError::InvalidInput(format!(
                    "capability '{entry}' must have the form 'resource=levels'"
                )));
            };

            // Capabilities on other resources do not concern roles.
            if resource.trim() != "roles" {
                continue;
            }

            for level in levels.split(',').map(str::trim) {
                match level {
                    "*" => capabilities = Self::all(),
                    "read" => capabilities.read = true,
                    "write" => capabilities.write = true,
                    _ => {
                        return Err(AppError::InvalidInput(format!(
                            "unknown capability level '{level}'"
                        )));
                    }
                }
            }
        }

        Ok(capabilities)
    }
}

/// IAM actions checked by the policy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IamAction {
    /// `iam:CreateRole`.
    CreateRole,
    /// `iam:DeleteRole`.
    DeleteRole,
    /// `iam:GetRole`.
    GetRole,
    /// `iam:UpdateAssumeRolePolicy`.
    UpdateAssumeRolePolicy,
    /// `iam:ListRoles`.
    ListRoles,
    /// `iam:PutRolePolicy`.
    PutRolePolicy,
    /// `iam:GetRolePolicy`.
    GetRolePolicy,
    /// `iam:ListRolePolicies`.
    ListRolePolicies,
    /// `iam:DeleteRolePolicy`.
    DeleteRolePolicy,
}

impl IamAction {
    /// Returns the action name used in policy documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateRole => "iam:CreateRole",
            Self::DeleteRole => "iam:DeleteRole",
            Self::GetRole => "iam:GetRole",
            Self::UpdateAssumeRolePolicy => "iam:UpdateAssumeRolePolicy",
            Self::ListRoles => "iam:ListRoles",
            Self::PutRolePolicy => "iam:PutRolePolicy",
            Self::GetRolePolicy => "iam:GetRolePolicy",
            Self::ListRolePolicies => "iam:ListRolePolicies",
            Self::DeleteRolePolicy => "iam:DeleteRolePolicy",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[IamAction] = &[
            IamAction::CreateRole,
            IamAction::DeleteRole,
            IamAction::GetRole,
            IamAction::UpdateAssumeRolePolicy,
            IamAction::ListRoles,
            IamAction::PutRolePolicy,
            IamAction::GetRolePolicy,
            IamAction::ListRolePolicies,
            IamAction::DeleteRolePolicy,
        ];

        ALL
    }
}

impl FromStr for IamAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown iam action '{value}'")))
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyDecision {
    /// The action is allowed on the resource.
    Allow,
    /// The action is denied, explicitly or implicitly.
    Deny,
}
