//! On-device storage of the account list.
//!
//! Accounts, their local settings snapshots and the last active account are
//! kept in a single JSON file.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::Account;
use crate::{Result, keys::PublicKey};

/// The current account store format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const STORE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the store version during deserialization.
fn validate_store_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != STORE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported account store version {version}; only version {STORE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Serialized form of the account store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoredAccounts {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_store_version"
    )]
    version: u8,
    #[serde(default)]
    pub(crate) accounts: Vec<Account>,
    /// Account that was active when the store was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) current: Option<PublicKey>,
}

impl StoredAccounts {
    pub(crate) fn new(accounts: Vec<Account>, current: Option<PublicKey>) -> Self {
        Self {
            version: STORE_VERSION,
            accounts,
            current,
        }
    }
}

/// Write the store to `path` as pretty JSON.
pub(crate) async fn save_to_file(store: &StoredAccounts, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Read the store from `path`. A missing file yields an empty store.
pub(crate) async fn load_from_file(path: &Path) -> Result<StoredAccounts> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No account store yet, starting empty");
            Ok(StoredAccounts::default())
        }
        Err(e) => Err(e.into()),
    }
}
