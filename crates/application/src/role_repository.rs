//! Role persistence over the name, info and path indices of a [`RoleStore`].

mod keys;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tessera_core::{AppError, AppResult, TenantName};
use tessera_domain::Role;

use crate::role_ports::{RoleListing, RoleStore};

/// Repository keeping the three role indices consistent.
///
/// Multi-key writes run on a spawned task so that dropping the caller's
/// future never leaves a partially written index set behind.
#[derive(Clone)]
pub struct RoleRepository {
    store: Arc<dyn RoleStore>,
}

impl RoleRepository {
    /// Creates a repository over a store implementation.
    #[must_use]
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Persists a new role under all three indices.
    ///
    /// On success `role` carries its id and creation date. With `exclusive`
    /// an existing entry at any index fails the call with `AlreadyExists`
    /// and the entries written by this attempt are removed again.
    pub async fn create(&self, role: &mut Role, exclusive: bool) -> AppResult<()> {
        role.validate()?;

        let id = if role.id().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            role.id().to_owned()
        };
        let creation_date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let staged = role.with_identity(id.as_str(), creation_date.as_str())?;

        // Name index first: it arbitrates concurrent creates of the same role.
        let writes = vec![
            (
                keys::name_key(staged.tenant(), staged.name()),
                staged.id().as_bytes().to_vec(),
            ),
            (keys::info_key(staged.id()), staged.encode()?),
            (
                keys::path_key(staged.tenant(), staged.path(), staged.name()),
                Vec::new(),
            ),
        ];

        let store = Arc::clone(&self.store);
        tokio::spawn(async move { write_indices(store.as_ref(), writes, exclusive).await })
            .await
            .map_err(|error| AppError::Internal(format!("role write task failed: {error}")))??;

        info!(
            role_id = %staged.id(),
            role_arn = %staged.arn(),
            "role created"
        );
        *role = staged;
        Ok(())
    }

    /// Removes every index entry of the role.
    ///
    /// The role is resolved by id when known, otherwise by `(tenant, name)`.
    /// A missing info entry fails with `NotFound`; name and path cleanup is
    /// best effort.
    pub async fn delete(&self, role: &Role) -> AppResult<()> {
        let id = if role.id().is_empty() {
            self.read_id(role.tenant(), role.name()).await?
        } else {
            role.id().to_owned()
        };
        let stored = self.read_info(id.as_str()).await?;

        if !stored.perm_policies().is_empty() {
            return Err(AppError::DeleteConflict(format!(
                "role '{}' still has {} permission policies attached",
                stored.name(),
                stored.perm_policies().len()
            )));
        }

        let info_key = keys::info_key(stored.id());
        let cleanup = [
            keys::name_key(stored.tenant(), stored.name()),
            keys::path_key(stored.tenant(), stored.path(), stored.name()),
        ];

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            store.delete(info_key.as_str()).await?;

            for key in cleanup {
                match store.delete(key.as_str()).await {
                    Ok(()) | Err(AppError::NotFound(_)) => {}
                    Err(error) => warn!(key = %key, error = %error, "failed to remove role index entry"),
                }
            }

            Ok::<(), AppError>(())
        })
        .await
        .map_err(|error| AppError::Internal(format!("role delete task failed: {error}")))??;

        info!(role_id = %stored.id(), role_arn = %stored.arn(), "role deleted");
        Ok(())
    }

    /// Overwrites the info entry of an already created role.
    ///
    /// The name index is read again after the write. If the role was deleted
    /// meanwhile, the rewritten info entry is removed and the call fails with
    /// `NotFound`. The store has no multi-key transactions, so a delete whose
    /// info removal lands before the write and whose name removal lands after
    /// the re-check can still leave an info entry reachable only by id.
    pub async fn update(&self, role: &Role) -> AppResult<()> {
        if role.id().is_empty() {
            return Err(AppError::NotFound(format!(
                "role '{}' has not been created",
                role.name()
            )));
        }

        let key = keys::info_key(role.id());
        self.store.get(key.as_str()).await?;
        self.store.put(key.as_str(), role.encode()?, false).await?;

        match self.read_id(role.tenant(), role.name()).await {
            Ok(id) if id == role.id() => {}
            Ok(_) | Err(AppError::NotFound(_)) => {
                if let Err(error) = self.store.delete(key.as_str()).await {
                    warn!(key = %key, error = %error, "failed to remove orphaned role info entry");
                }
                return Err(AppError::NotFound(format!(
                    "role '{}' was deleted during the update",
                    role.name()
                )));
            }
            Err(error) => return Err(error),
        }

        info!(role_id = %role.id(), role_arn = %role.arn(), "role updated");
        Ok(())
    }

    /// Resolves a role through the name index.
    pub async fn get(&self, tenant: &TenantName, name: &str) -> AppResult<Role> {
        let id = self.read_id(tenant, name).await?;
        self.read_info(id.as_str()).await
    }

    /// Resolves a role through the info index.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Role> {
        if id.is_empty() {
            return Err(AppError::InvalidInput("role id must not be empty".to_owned()));
        }

        self.read_info(id).await
    }

    /// Lists roles of a tenant whose path starts with `path_prefix`.
    ///
    /// Entries sort by `(path, name)`; `marker` resumes after the entry it
    /// names. Path entries whose role no longer resolves, or resolves to a
    /// role under another path, are skipped.
    pub async fn list(
        &self,
        tenant: &TenantName,
        path_prefix: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> AppResult<RoleListing> {
        let after = marker.map(keys::parse_marker).transpose()?;
        let root = keys::path_root(tenant);
        let scanned = self.store.scan(format!("{root}{path_prefix}").as_str()).await?;
        debug!(tenant = %tenant, path_prefix, entries = scanned.len(), "scanned role path index");

        let mut entries = Vec::with_capacity(scanned.len());
        for key in scanned {
            match keys::split_path_key(key.as_str(), root.as_str()) {
                Some(entry) => entries.push(entry),
                None => warn!(key = %key, "skipping malformed role path entry"),
            }
        }
        entries.sort();
        entries.dedup();

        let mut roles = Vec::new();
        let mut last_entry = None;
        let mut is_truncated = false;

        for entry in entries
            .into_iter()
            .filter(|entry| after.as_ref().is_none_or(|after| entry > after))
        {
            if roles.len() == max_items {
                is_truncated = true;
                break;
            }

            match self.get(tenant, entry.1.as_str()).await {
                Ok(role) if role.path() == entry.0 => {
                    roles.push(role);
                    last_entry = Some(entry);
                }
                Ok(role) => warn!(
                    tenant = %tenant,
                    path = %entry.0,
                    name = %entry.1,
                    role_path = %role.path(),
                    "skipping path entry left behind by an earlier role"
                ),
                Err(AppError::NotFound(_)) => warn!(
                    tenant = %tenant,
                    path = %entry.0,
                    name = %entry.1,
                    "skipping stale role path entry"
                ),
                Err(error) => return Err(error),
            }
        }

        let marker = match (is_truncated, last_entry) {
            (true, Some((path, name))) => Some(keys::marker(path.as_str(), name.as_str())),
            _ => None,
        };

        Ok(RoleListing {
            roles,
            is_truncated,
            marker,
        })
    }

    async fn read_id(&self, tenant: &TenantName, name: &str) -> AppResult<String> {
        let bytes = self
            .store
            .get(keys::name_key(tenant, name).as_str())
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => AppError::NotFound(format!(
                    "role '{name}' does not exist in tenant '{tenant}'"
                )),
                other => other,
            })?;

        String::from_utf8(bytes).map_err(|error| {
            AppError::Internal(format!("corrupt role name index for '{name}': {error}"))
        })
    }

    async fn read_info(&self, id: &str) -> AppResult<Role> {
        let bytes = self
            .store
            .get(keys::info_key(id).as_str())
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => {
                    AppError::NotFound(format!("role with id '{id}' does not exist"))
                }
                other => other,
            })?;

        Role::decode(bytes.as_slice())
    }
}

async fn write_indices(
    store: &dyn RoleStore,
    writes: Vec<(String, Vec<u8>)>,
    exclusive: bool,
) -> AppResult<()> {
    let mut written: Vec<String> = Vec::with_capacity(writes.len());

    for (key, value) in writes {
        if let Err(error) = store.put(key.as_str(), value, exclusive).await {
            if exclusive {
                roll_back(store, written.as_slice()).await;
            }
            return Err(error);
        }
        written.push(key);
    }

    Ok(())
}

async fn roll_back(store: &dyn RoleStore, written: &[String]) {
    for key in written.iter().rev() {
        if let Err(error) = store.delete(key.as_str()).await {
            warn!(key = %key, error = %error, "failed to roll back role index entry");
        }
    }
}
