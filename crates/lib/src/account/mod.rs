//! Account session state
//!
//! Tracks the accounts known to this device, which one is active, and the
//! settings snapshot each account last saved locally. The active account is
//! published through a reactive container so that dependents can follow
//! logins, switches and logouts.

pub mod errors;
mod persistence;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

pub use errors::AccountError;

use crate::{
    Clock, Result,
    keys::PublicKey,
    reactive::{PersistentSubject, ReadonlySubject},
    settings::{AppSettings, decode_settings},
};
use persistence::StoredAccounts;

/// An account known to this device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub pubkey: PublicKey,

    /// The device cannot sign for this account
    #[serde(default)]
    pub readonly: bool,

    /// When the account was added (Unix timestamp, seconds)
    #[serde(default)]
    pub added_at: u64,

    /// Settings last saved on this device for this account
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_local_settings"
    )]
    pub local_settings: Option<AppSettings>,
}

impl Account {
    /// An account that can sign, without local settings.
    pub fn new(pubkey: PublicKey) -> Self {
        Self {
            pubkey,
            readonly: false,
            added_at: 0,
            local_settings: None,
        }
    }

    /// A watch-only account.
    pub fn readonly(pubkey: PublicKey) -> Self {
        Self {
            readonly: true,
            ..Self::new(pubkey)
        }
    }

    /// Attach a local settings snapshot.
    pub fn with_local_settings(mut self, settings: AppSettings) -> Self {
        self.local_settings = Some(settings);
        self
    }
}

/// Local settings may have been written by an older client. They go through
/// the migration chain; a snapshot that cannot be decoded is dropped rather
/// than failing the whole store.
fn deserialize_local_settings<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<AppSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match decode_settings(raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("Discarding unreadable local settings: {e}");
            None
        }
    }))
}

/// The accounts of this device and the active one.
///
/// When opened with a path, every change is written back to that file.
pub struct AccountService {
    accounts: RwLock<Vec<Account>>,
    current: PersistentSubject<Option<Account>>,
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// An account service that keeps everything in memory.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            current: PersistentSubject::new(None),
            path: None,
            clock,
        }
    }

    /// Load the account store at `path`, creating it on first write.
    ///
    /// The account that was active when the store was last written becomes
    /// active again.
    pub async fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stored = persistence::load_from_file(&path).await?;

        let current = stored
            .current
            .as_ref()
            .and_then(|key| stored.accounts.iter().find(|a| &a.pubkey == key))
            .cloned();
        tracing::info!(
            accounts = stored.accounts.len(),
            active = current.as_ref().map(|a| a.pubkey.short()),
            "Loaded account store from {}",
            path.display()
        );

        Ok(Self {
            accounts: RwLock::new(stored.accounts),
            current: PersistentSubject::new(current),
            path: Some(path),
            clock,
        })
    }

    /// An in-memory copy of these accounts with none active.
    ///
    /// Changes to the copy are never written back.
    pub async fn detached(&self) -> Self {
        let service = Self::new(Arc::clone(&self.clock));
        *service.accounts.write().await = self.accounts().await;
        service
    }

    /// The active account, as a container that follows every change.
    pub fn current(&self) -> ReadonlySubject<Option<Account>> {
        self.current.readonly()
    }

    /// The active account right now.
    pub fn active(&self) -> Option<Account> {
        self.current.get()
    }

    /// Every account on this device.
    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    /// Look up an account.
    pub async fn get(&self, pubkey: &PublicKey) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| &a.pubkey == pubkey)
            .cloned()
    }

    /// Add an account, replacing any stored account with the same key.
    ///
    /// Replacing the active account re-publishes it as the active account.
    pub async fn add_account(&self, mut account: Account) -> Result<()> {
        {
            let mut accounts = self.accounts.write().await;
            match accounts.iter_mut().find(|a| a.pubkey == account.pubkey) {
                Some(existing) => {
                    if account.added_at == 0 {
                        account.added_at = existing.added_at;
                    }
                    *existing = account.clone();
                }
                None => {
                    if account.added_at == 0 {
                        account.added_at = self.clock.now_secs();
                    }
                    accounts.push(account.clone());
                }
            }
        }
        tracing::debug!(pubkey = account.pubkey.short(), "Stored account");

        let is_active = self.current.with(|current| {
            current
                .as_ref()
                .is_some_and(|active| active.pubkey == account.pubkey)
        });
        if is_active {
            self.current.set(Some(account));
        }
        self.persist().await
    }

    /// Remove an account. Removing the active account logs out.
    pub async fn remove_account(&self, pubkey: &PublicKey) -> Result<()> {
        {
            let mut accounts = self.accounts.write().await;
            let before = accounts.len();
            accounts.retain(|a| &a.pubkey != pubkey);
            if accounts.len() == before {
                return Err(AccountError::NotFound {
                    pubkey: pubkey.clone(),
                }
                .into());
            }
        }

        if self.is_active(pubkey) {
            self.current.set(None);
        }
        self.persist().await
    }

    /// Make `pubkey` the active account.
    pub async fn switch_account(&self, pubkey: &PublicKey) -> Result<()> {
        let account = self
            .get(pubkey)
            .await
            .ok_or_else(|| AccountError::NotFound {
                pubkey: pubkey.clone(),
            })?;
        tracing::info!(pubkey = pubkey.short(), "Switching account");
        self.current.set(Some(account));
        self.persist().await
    }

    /// Clear the active account.
    pub async fn logout(&self) -> Result<()> {
        tracing::info!("Logging out");
        self.current.set(None);
        self.persist().await
    }

    /// Save a settings snapshot for `pubkey` on this device.
    ///
    /// Only the stored record changes. The active account container is not
    /// re-published, so this does not count as an account change.
    pub async fn update_local_settings(
        &self,
        pubkey: &PublicKey,
        settings: AppSettings,
    ) -> Result<()> {
        {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .iter_mut()
                .find(|a| &a.pubkey == pubkey)
                .ok_or_else(|| AccountError::NotFound {
                    pubkey: pubkey.clone(),
                })?;
            account.local_settings = Some(settings);
        }
        tracing::debug!(pubkey = pubkey.short(), "Saved local settings");
        self.persist().await
    }

    fn is_active(&self, pubkey: &PublicKey) -> bool {
        self.current
            .with(|current| current.as_ref().is_some_and(|a| &a.pubkey == pubkey))
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let accounts = self.accounts.read().await.clone();
        let current = self.current.with(|c| c.as_ref().map(|a| a.pubkey.clone()));
        persistence::save_to_file(&StoredAccounts::new(accounts, current), path).await
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("active", &self.active().map(|a| a.pubkey))
            .field("path", &self.path)
            .finish()
    }
}
