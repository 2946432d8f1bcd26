use tessera_core::{AppError, AppResult, TENANT_DELIMITER, TenantName};

const NAME_INDEX_PREFIX: &str = "role_names.";
const INFO_INDEX_PREFIX: &str = "roles.";
const PATH_INDEX_PREFIX: &str = "role_paths.";

/// Key of the name-index entry holding the role id.
pub(super) fn name_key(tenant: &TenantName, name: &str) -> String {
    format!("{NAME_INDEX_PREFIX}{tenant}{TENANT_DELIMITER}{name}")
}

/// Key of the info-index entry holding the encoded role.
pub(super) fn info_key(id: &str) -> String {
    format!("{INFO_INDEX_PREFIX}{id}")
}

/// Key of the path-index presence marker.
pub(super) fn path_key(tenant: &TenantName, path: &str, name: &str) -> String {
    format!("{}{path}{TENANT_DELIMITER}{name}", path_root(tenant))
}

/// Common prefix of every path-index key in a tenant.
pub(super) fn path_root(tenant: &TenantName) -> String {
    format!("{PATH_INDEX_PREFIX}{tenant}{TENANT_DELIMITER}")
}

/// Splits a path-index key into `(path, name)`.
///
/// Names never contain the delimiter, so the last one separates them.
pub(super) fn split_path_key(key: &str, root: &str) -> Option<(String, String)> {
    let (path, name) = key.strip_prefix(root)?.rsplit_once(TENANT_DELIMITER)?;
    if name.is_empty() {
        return None;
    }

    Some((path.to_owned(), name.to_owned()))
}

/// Renders the listing marker for a `(path, name)` entry.
pub(super) fn marker(path: &str, name: &str) -> String {
    format!("{path}{TENANT_DELIMITER}{name}")
}

/// Parses a listing marker back into `(path, name)`.
pub(super) fn parse_marker(marker: &str) -> AppResult<(String, String)> {
    marker
        .rsplit_once(TENANT_DELIMITER)
        .filter(|(path, name)| path.starts_with('/') && !name.is_empty())
        .map(|(path, name)| (path.to_owned(), name.to_owned()))
        .ok_or_else(|| AppError::InvalidInput(format!("malformed listing marker '{marker}'")))
}
