//! Role entity and its invariants.
//!
//! A role is a tenant-scoped principal identified by `(tenant, name)`, placed
//! under a path, carrying a trust policy and a map of permission policies.
//! Name, tenant and path are fixed after construction so the derived ARN can
//! never drift from them.

mod encoding;

use std::collections::BTreeMap;

use tessera_core::{AppError, AppResult, TENANT_DELIMITER, TenantName};

pub use encoding::{ROLE_ENCODING_COMPAT_VERSION, ROLE_ENCODING_VERSION};

/// Maximum role name length in characters.
pub const MAX_ROLE_NAME_LEN: usize = 64;

/// Maximum role path length in characters.
pub const MAX_PATH_NAME_LEN: usize = 512;

/// Shortest allowed session for an assumed role, in seconds.
pub const SESSION_DURATION_MIN: u64 = 3600;

/// Longest allowed session for an assumed role, in seconds.
pub const SESSION_DURATION_MAX: u64 = 43200;

/// Prefix of every role ARN.
pub const ROLE_ARN_PREFIX: &str = "arn:aws:iam::";

/// Path assigned when the caller supplies none.
pub const DEFAULT_ROLE_PATH: &str = "/";

/// Returns the ARN of the role identified by `(tenant, path, name)`.
#[must_use]
pub fn role_arn(tenant: &TenantName, path: &str, name: &str) -> String {
    format!("{ROLE_ARN_PREFIX}{tenant}:role{path}{name}")
}

/// Returns whether a character is allowed in role and policy names.
#[must_use]
pub fn is_name_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || "+=,.@_-".contains(character)
}

/// Role entity persisted by the role store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: String,
    name: String,
    path: String,
    arn: String,
    creation_date: String,
    trust_policy: String,
    perm_policy_map: BTreeMap<String, String>,
    tenant: TenantName,
    max_session_duration: u64,
}

impl Role {
    /// Creates a new, not yet persisted role.
    ///
    /// A `tenant$name` input overrides `tenant`. An empty path becomes `/`
    /// and a missing session duration becomes [`SESSION_DURATION_MIN`].
    /// Range checks happen in [`Role::validate`].
    pub fn new(
        name: impl Into<String>,
        tenant: TenantName,
        path: impl Into<String>,
        trust_policy: impl Into<String>,
        max_session_duration: Option<&str>,
    ) -> AppResult<Self> {
        let (tenant, name) = extract_name_tenant(name.into(), tenant)?;

        let mut path = path.into();
        if path.is_empty() {
            path = DEFAULT_ROLE_PATH.to_owned();
        }

        let max_session_duration = match max_session_duration.map(str::trim) {
            None | Some("") => SESSION_DURATION_MIN,
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::InvalidInput(format!(
                    "max session duration '{value}' is not a number of seconds: {error}"
                ))
            })?,
        };

        let arn = role_arn(&tenant, path.as_str(), name.as_str());

        Ok(Self {
            id: String::new(),
            name,
            path,
            arn,
            creation_date: String::new(),
            trust_policy: trust_policy.into(),
            perm_policy_map: BTreeMap::new(),
            tenant,
            max_session_duration,
        })
    }

    /// Creates a placeholder for a lookup by role id.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            path: String::new(),
            arn: String::new(),
            creation_date: String::new(),
            trust_policy: String::new(),
            perm_policy_map: BTreeMap::new(),
            tenant: TenantName::global(),
            max_session_duration: SESSION_DURATION_MIN,
        }
    }

    /// Checks name, path and session duration constraints.
    pub fn validate(&self) -> AppResult<()> {
        let name_len = self.name.chars().count();
        if name_len == 0 || name_len > MAX_ROLE_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "role name must be between 1 and {MAX_ROLE_NAME_LEN} characters"
            )));
        }

        if let Some(invalid) = self.name.chars().find(|value| !is_name_char(*value)) {
            return Err(AppError::InvalidInput(format!(
                "role name '{}' contains invalid character '{invalid}'",
                self.name
            )));
        }

        let path_len = self.path.chars().count();
        if path_len == 0 || path_len > MAX_PATH_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "role path must be between 1 and {MAX_PATH_NAME_LEN} characters"
            )));
        }

        if !self.path.starts_with('/') {
            return Err(AppError::InvalidInput(format!(
                "role path '{}' must start with '/'",
                self.path
            )));
        }

        if self.path.chars().any(|value| !('!'..='~').contains(&value)) {
            return Err(AppError::InvalidInput(format!(
                "role path '{}' must contain printable ASCII characters only",
                self.path
            )));
        }

        if !(SESSION_DURATION_MIN..=SESSION_DURATION_MAX).contains(&self.max_session_duration) {
            return Err(AppError::InvalidInput(format!(
                "max session duration {} must be between {SESSION_DURATION_MIN} and {SESSION_DURATION_MAX} seconds",
                self.max_session_duration
            )));
        }

        Ok(())
    }

    /// Returns a copy carrying the store-assigned identity.
    ///
    /// Fails when the role already holds a different id.
    pub fn with_identity(&self, id: &str, creation_date: &str) -> AppResult<Self> {
        if id.is_empty() {
            return Err(AppError::Internal("role id must not be empty".to_owned()));
        }

        if !self.id.is_empty() && self.id != id {
            return Err(AppError::Internal(format!(
                "role '{}' already has id '{}'",
                self.name, self.id
            )));
        }

        let mut staged = self.clone();
        staged.id = id.to_owned();
        if staged.creation_date.is_empty() {
            staged.creation_date = creation_date.to_owned();
        }

        Ok(staged)
    }

    /// Returns the store-assigned id, empty until first persisted.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the role name without its tenant.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the role tenant.
    #[must_use]
    pub fn tenant(&self) -> &TenantName {
        &self.tenant
    }

    /// Returns the role path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the derived role ARN.
    #[must_use]
    pub fn arn(&self) -> &str {
        self.arn.as_str()
    }

    /// Returns the creation timestamp in RFC3339, empty until persisted.
    #[must_use]
    pub fn creation_date(&self) -> &str {
        self.creation_date.as_str()
    }

    /// Returns the trust (assume role) policy document.
    #[must_use]
    pub fn trust_policy(&self) -> &str {
        self.trust_policy.as_str()
    }

    /// Returns the maximum session duration in seconds.
    #[must_use]
    pub fn max_session_duration(&self) -> u64 {
        self.max_session_duration
    }

    /// Returns attached permission policies keyed by policy name.
    #[must_use]
    pub fn perm_policies(&self) -> &BTreeMap<String, String> {
        &self.perm_policy_map
    }

    /// Replaces the trust policy. Persist with a store update.
    pub fn update_trust_policy(&mut self, trust_policy: impl Into<String>) {
        self.trust_policy = trust_policy.into();
    }

    /// Attaches or replaces a permission policy.
    pub fn set_perm_policy(&mut self, policy_name: impl Into<String>, document: impl Into<String>) {
        self.perm_policy_map
            .insert(policy_name.into(), document.into());
    }

    /// Returns the permission policy document attached under `policy_name`.
    pub fn get_role_policy(&self, policy_name: &str) -> AppResult<&str> {
        self.perm_policy_map
            .get(policy_name)
            .map(String::as_str)
            .ok_or_else(|| self.policy_not_found(policy_name))
    }

    /// Detaches the permission policy named `policy_name`.
    pub fn delete_policy(&mut self, policy_name: &str) -> AppResult<()> {
        match self.perm_policy_map.remove(policy_name) {
            Some(_) => Ok(()),
            None => Err(self.policy_not_found(policy_name)),
        }
    }

    /// Lists attached permission policy names in lexical order.
    #[must_use]
    pub fn list_policy_names(&self) -> Vec<String> {
        self.perm_policy_map.keys().cloned().collect()
    }

    fn policy_not_found(&self, policy_name: &str) -> AppError {
        AppError::PolicyNotFound(format!(
            "policy '{policy_name}' is not attached to role '{}'",
            self.name
        ))
    }
}

/// Splits a `tenant$name` input; inputs without a delimiter keep `tenant`.
pub fn extract_name_tenant(
    name: String,
    tenant: TenantName,
) -> AppResult<(TenantName, String)> {
    match name.split_once(TENANT_DELIMITER) {
        Some((tenant_part, name_part)) => {
            if name_part.contains(TENANT_DELIMITER) {
                return Err(AppError::InvalidInput(format!(
                    "role name '{name_part}' must not contain '{TENANT_DELIMITER}'"
                )));
            }

            Ok((TenantName::new(tenant_part)?, name_part.to_owned()))
        }
        None => Ok((tenant, name)),
    }
}
