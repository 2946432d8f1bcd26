//! Versioned binary envelope for persisted roles.
//!
//! Layout: `[struct_version: u8][compat_version: u8][payload_len: u32 LE][payload]`.
//! The payload holds the fields in fixed order, each encoded with bincode's
//! fixed-width little-endian format:
//!
//! | version | fields |
//! |---------|--------|
//! | 1 | id, name, path, arn, creation_date, trust_policy, perm_policy_map |
//! | 2 | + tenant |
//! | 3 | + max_session_duration |
//!
//! Writers always emit the current version. Readers accept every version up
//! to the current one and default the fields a payload predates. Payloads from
//! newer writers decode as long as their compat version is supported; trailing
//! fields are skipped.

use std::collections::BTreeMap;

use bincode::Options;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tessera_core::{AppError, AppResult, TenantName};

use super::{Role, SESSION_DURATION_MIN};

/// Version written by the current encoder.
pub const ROLE_ENCODING_VERSION: u8 = 3;

/// Oldest reader version able to decode what the current encoder writes.
pub const ROLE_ENCODING_COMPAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 6;

pub(crate) fn field_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

impl Role {
    /// Encodes the role with the current envelope version.
    pub fn encode(&self) -> AppResult<Vec<u8>> {
        let mut payload = Vec::new();
        write_field(&mut payload, "id", &self.id)?;
        write_field(&mut payload, "name", &self.name)?;
        write_field(&mut payload, "path", &self.path)?;
        write_field(&mut payload, "arn", &self.arn)?;
        write_field(&mut payload, "creation_date", &self.creation_date)?;
        write_field(&mut payload, "trust_policy", &self.trust_policy)?;
        write_field(&mut payload, "perm_policy_map", &self.perm_policy_map)?;
        write_field(&mut payload, "tenant", self.tenant.as_str())?;
        write_field(
            &mut payload,
            "max_session_duration",
            &self.max_session_duration,
        )?;

        seal(ROLE_ENCODING_VERSION, ROLE_ENCODING_COMPAT_VERSION, payload)
    }

    /// Decodes a role written by any supported encoder version.
    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        let Some((header, rest)) = bytes.split_first_chunk::<HEADER_LEN>() else {
            return Err(corrupt("envelope header is truncated"));
        };

        let [struct_version, compat_version, len @ ..] = *header;
        if struct_version == 0 {
            return Err(corrupt("envelope version 0 is not valid"));
        }

        if compat_version > ROLE_ENCODING_VERSION {
            return Err(corrupt(&format!(
                "envelope requires decoder version {compat_version}, supported up to {ROLE_ENCODING_VERSION}"
            )));
        }

        let payload_len = usize::try_from(u32::from_le_bytes(len))
            .map_err(|error| corrupt(&format!("payload length overflow: {error}")))?;
        let payload = rest
            .get(..payload_len)
            .ok_or_else(|| corrupt("payload is shorter than its declared length"))?;

        let mut reader = payload;
        let id: String = read_field(&mut reader, payload_len, "id")?;
        let name: String = read_field(&mut reader, payload_len, "name")?;
        let path: String = read_field(&mut reader, payload_len, "path")?;
        let arn: String = read_field(&mut reader, payload_len, "arn")?;
        let creation_date: String = read_field(&mut reader, payload_len, "creation_date")?;
        let trust_policy: String = read_field(&mut reader, payload_len, "trust_policy")?;
        let perm_policy_map: BTreeMap<String, String> =
            read_field(&mut reader, payload_len, "perm_policy_map")?;

        let (tenant, max_session_duration) = match struct_version {
            1 => (String::new(), SESSION_DURATION_MIN),
            2 => (
                read_field(&mut reader, payload_len, "tenant")?,
                SESSION_DURATION_MIN,
            ),
            _ => (
                read_field(&mut reader, payload_len, "tenant")?,
                read_field(&mut reader, payload_len, "max_session_duration")?,
            ),
        };

        let tenant = TenantName::new(tenant)
            .map_err(|error| corrupt(&format!("stored tenant is invalid: {error}")))?;

        Ok(Self {
            id,
            name,
            path,
            arn,
            creation_date,
            trust_policy,
            perm_policy_map,
            tenant,
            max_session_duration,
        })
    }
}

pub(crate) fn seal(
    struct_version: u8,
    compat_version: u8,
    payload: Vec<u8>,
) -> AppResult<Vec<u8>> {
    let payload_len = u32::try_from(payload.len()).map_err(|error| {
        AppError::Internal(format!("role payload exceeds envelope limit: {error}"))
    })?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.push(struct_version);
    bytes.push(compat_version);
    bytes.extend_from_slice(&payload_len.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub(crate) fn write_field<T: Serialize + ?Sized>(
    payload: &mut Vec<u8>,
    field: &str,
    value: &T,
) -> AppResult<()> {
    field_options()
        .serialize_into(payload, value)
        .map_err(|error| AppError::Internal(format!("failed to encode role {field}: {error}")))
}

fn read_field<T: DeserializeOwned>(
    reader: &mut &[u8],
    payload_len: usize,
    field: &str,
) -> AppResult<T> {
    field_options()
        .with_limit(payload_len as u64)
        .deserialize_from(reader)
        .map_err(|error| corrupt(&format!("failed to decode {field}: {error}")))
}

fn corrupt(detail: &str) -> AppError {
    AppError::Internal(format!("corrupt role record: {detail}"))
}
