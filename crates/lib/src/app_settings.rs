//! The authoritative settings of the running client.
//!
//! [`AppSettingsService`] follows the active account and keeps one settings
//! container up to date for it. Every change of the active account (login,
//! switch, logout) re-runs resolution:
//!
//! 1. Any forwarding from the previous account's remote settings is torn down.
//! 2. With no account, the defaults are pushed and resolution stops.
//! 3. The account's locally saved settings, if any, are pushed.
//! 4. The remote settings are requested from the current read relays, always
//!    going to the network.
//! 5. The defaults are pushed.
//! 6. The container is connected to the remote settings, so whatever the
//!    relays have (now or later) overrides the interim values.
//!
//! If the relays never answer, the container stays at the defaults.

use std::sync::{Arc, Mutex, Weak};

use crate::{
    Clock, Result,
    account::{Account, AccountError, AccountService},
    event::{EventTemplate, build_settings_event},
    fetcher::{RequestOptions, SettingsFetcher},
    keys::PublicKey,
    reactive::{PersistentSubject, ReadonlySubject, Subject, Subscription, lock},
    relay::ClientRelays,
    settings::AppSettings,
};

/// Where resolution stands for the active account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionState {
    /// No account is active; the settings are the defaults.
    NoIdentity,
    /// Connected to the account's remote settings, which have not arrived.
    AwaitingRemote { pubkey: PublicKey },
    /// Connected to the account's remote settings, which have arrived.
    WithRemote { pubkey: PublicKey },
}

enum Tracking {
    NoIdentity,
    Remote {
        pubkey: PublicKey,
        remote: Subject<AppSettings>,
    },
}

struct Core {
    accounts: Arc<AccountService>,
    relays: Arc<ClientRelays>,
    fetcher: Arc<dyn SettingsFetcher>,
    clock: Arc<dyn Clock>,
    defaults: AppSettings,
    settings: PersistentSubject<AppSettings>,
    /// Serializes resolution runs and every push made by this service.
    transition: Mutex<()>,
    tracking: Mutex<Tracking>,
}

impl Core {
    fn resolve(&self, account: Option<&Account>) {
        let _transition = lock(&self.transition);

        self.settings.disconnect_all();

        let Some(account) = account else {
            tracing::debug!("No active account, using default settings");
            *lock(&self.tracking) = Tracking::NoIdentity;
            self.settings.set(self.defaults.clone());
            return;
        };

        let pubkey = &account.pubkey;
        if let Some(local) = &account.local_settings {
            tracing::debug!(pubkey = pubkey.short(), "Applying local settings");
            self.settings.set(local.clone());
        }

        let relays = self.relays.read_relays().get();
        tracing::debug!(
            pubkey = pubkey.short(),
            relays = relays.len(),
            "Requesting remote settings"
        );
        let remote =
            self.fetcher
                .request_app_settings(pubkey, &relays, RequestOptions::force_refresh());

        self.settings.set(self.defaults.clone());

        *lock(&self.tracking) = Tracking::Remote {
            pubkey: pubkey.clone(),
            remote: remote.clone(),
        };
        // The connection is owned by the container and torn down on the next
        // run.
        let _connection = self.settings.connect(&remote);
    }

    fn state(&self) -> ResolutionState {
        match &*lock(&self.tracking) {
            Tracking::NoIdentity => ResolutionState::NoIdentity,
            Tracking::Remote { pubkey, remote } if remote.has_value() => {
                ResolutionState::WithRemote {
                    pubkey: pubkey.clone(),
                }
            }
            Tracking::Remote { pubkey, .. } => ResolutionState::AwaitingRemote {
                pubkey: pubkey.clone(),
            },
        }
    }
}

/// Resolves and publishes the settings of the active account.
///
/// There is one of these per client, built by whoever wires the client
/// together and shared from there. Only this service writes to the settings
/// container; everything else reads it through [`settings`](Self::settings).
///
/// Observers of [`settings`](Self::settings) run while resolution is in
/// progress and must not switch accounts or call
/// [`replace_settings`](Self::replace_settings) from inside the callback.
pub struct AppSettingsService {
    core: Arc<Core>,
    _account_changes: Subscription,
    _change_log: Subscription,
}

impl AppSettingsService {
    /// Build the service and resolve for the account active right now.
    pub fn new(
        accounts: Arc<AccountService>,
        relays: Arc<ClientRelays>,
        fetcher: Arc<dyn SettingsFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let defaults = AppSettings::default();
        let core = Arc::new(Core {
            accounts: Arc::clone(&accounts),
            relays,
            fetcher,
            clock,
            settings: PersistentSubject::new(defaults.clone()),
            defaults,
            transition: Mutex::new(()),
            tracking: Mutex::new(Tracking::NoIdentity),
        });

        let change_log = core.settings.subscribe(|settings: &AppSettings| {
            tracing::debug!(
                color_mode = ?settings.color_mode,
                "App settings changed"
            );
        });

        let weak: Weak<Core> = Arc::downgrade(&core);
        let account_changes = accounts.current().subscribe(move |account: &Option<Account>| {
            if let Some(core) = weak.upgrade() {
                core.resolve(account.as_ref());
            }
        });

        Self {
            core,
            _account_changes: account_changes,
            _change_log: change_log,
        }
    }

    /// The authoritative settings.
    pub fn settings(&self) -> ReadonlySubject<AppSettings> {
        self.core.settings.readonly()
    }

    /// The settings used when nothing better is known.
    pub fn defaults(&self) -> &AppSettings {
        &self.core.defaults
    }

    pub fn state(&self) -> ResolutionState {
        self.core.state()
    }

    /// Apply settings edited by the user.
    ///
    /// The settings are saved as the active account's local settings and
    /// become the authoritative value. For accounts that can sign, the
    /// returned template is the settings event to sign and publish; until it
    /// reaches the relays, a newer remote event would still take over.
    pub async fn replace_settings(&self, settings: AppSettings) -> Result<Option<EventTemplate>> {
        let account = self
            .core
            .accounts
            .active()
            .ok_or(AccountError::NoActiveAccount)?;

        self.core
            .accounts
            .update_local_settings(&account.pubkey, settings.clone())
            .await?;

        let template = if account.readonly {
            None
        } else {
            Some(build_settings_event(&settings, self.core.clock.as_ref())?)
        };

        {
            let _transition = lock(&self.core.transition);
            let still_active = matches!(
                &*lock(&self.core.tracking),
                Tracking::Remote { pubkey, .. } if *pubkey == account.pubkey
            );
            if still_active {
                tracing::info!(pubkey = account.pubkey.short(), "Settings replaced");
                self.core.settings.set(settings);
            } else {
                tracing::debug!(
                    pubkey = account.pubkey.short(),
                    "Account changed while saving settings, not applying"
                );
            }
        }

        Ok(template)
    }
}

impl Drop for AppSettingsService {
    fn drop(&mut self) {
        self.core.settings.disconnect_all();
    }
}

impl std::fmt::Debug for AppSettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettingsService")
            .field("state", &self.state())
            .finish()
    }
}
