//! Remote settings fetcher.
//!
//! Looks up an account's settings event on its relays and publishes the
//! decoded settings through a per-account [`Subject`]. The subject stays empty
//! until a valid settings event is found, and is updated every time a newer
//! one arrives. Events that fail to decode are logged and dropped; callers
//! never see an error.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    event::{Event, EventVersion, settings_from_event},
    keys::PublicKey,
    reactive::{Subject, lock},
    relay::{EventSource, Filter, RelaySet},
    settings::AppSettings,
};

/// How a settings request treats work already done for the same account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Query the relays even if they were queried for this account before
    pub always_request: bool,
}

impl RequestOptions {
    /// Always go to the network.
    pub fn force_refresh() -> Self {
        Self {
            always_request: true,
        }
    }
}

/// Provides the remote settings of an account.
pub trait SettingsFetcher: Send + Sync {
    /// Get the settings subject of `pubkey`, querying `relays` as `options`
    /// dictate.
    ///
    /// Calls for the same account converge on the same settings. An empty
    /// relay set is allowed; the subject may then never receive a value.
    fn request_app_settings(
        &self,
        pubkey: &PublicKey,
        relays: &RelaySet,
        options: RequestOptions,
    ) -> Subject<AppSettings>;
}

struct CachedSettings {
    subject: Subject<AppSettings>,
    /// Newest accepted event. Held while a value is decoded and set, so
    /// concurrent deliveries reach the subject in version order.
    latest: Arc<Mutex<Option<EventVersion>>>,
    requested: RelaySet,
    tasks: Vec<JoinHandle<()>>,
}

impl CachedSettings {
    fn new() -> Self {
        Self {
            subject: Subject::empty(),
            latest: Arc::new(Mutex::new(None)),
            requested: RelaySet::new(),
            tasks: Vec::new(),
        }
    }
}

struct FetcherInner {
    source: Arc<dyn EventSource>,
    runtime: Handle,
    cache: Mutex<HashMap<PublicKey, CachedSettings>>,
}

impl FetcherInner {
    fn handle_event(&self, event: Event) -> bool {
        if !event.is_settings_event() {
            tracing::trace!(id = %event.id, kind = event.kind, "Ignoring non-settings event");
            return false;
        }

        let (subject, latest) = {
            let cache = lock(&self.cache);
            let Some(entry) = cache.get(&event.pubkey) else {
                tracing::trace!(
                    pubkey = event.pubkey.short(),
                    "Ignoring settings event for unknown account"
                );
                return false;
            };
            (entry.subject.clone(), Arc::clone(&entry.latest))
        };

        let mut latest = lock(&latest);
        let version = event.version();
        if latest.as_ref().is_some_and(|current| !version.supersedes(current)) {
            tracing::trace!(id = %event.id, "Ignoring stale settings event");
            return false;
        }

        let settings = match settings_from_event(&event) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    pubkey = event.pubkey.short(),
                    id = %event.id,
                    "Failed to decode settings event: {e}"
                );
                return false;
            }
        };

        tracing::debug!(
            pubkey = event.pubkey.short(),
            created_at = event.created_at,
            "Received newer settings event"
        );
        *latest = Some(version);
        subject.set(settings);
        true
    }
}

impl Drop for FetcherInner {
    fn drop(&mut self) {
        for entry in lock(&self.cache).values() {
            for task in &entry.tasks {
                task.abort();
            }
        }
    }
}

/// [`SettingsFetcher`] backed by an [`EventSource`].
///
/// Keeps one subject per account for the lifetime of the fetcher. Requests
/// run as tasks on the runtime given at construction and stay subscribed, so
/// settings published later still arrive.
pub struct UserAppSettings {
    inner: Arc<FetcherInner>,
}

impl UserAppSettings {
    pub fn new(source: Arc<dyn EventSource>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                source,
                runtime,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Feed an event obtained elsewhere, such as one this client just
    /// published. Returns `true` if it became the account's settings.
    pub fn handle_event(&self, event: Event) -> bool {
        self.inner.handle_event(event)
    }

    /// The newest settings known for `pubkey`, if any.
    pub fn cached(&self, pubkey: &PublicKey) -> Option<AppSettings> {
        lock(&self.inner.cache)
            .get(pubkey)
            .and_then(|entry| entry.subject.get())
    }

    fn spawn_request(&self, pubkey: PublicKey, relays: RelaySet) -> JoinHandle<()> {
        let source = Arc::clone(&self.inner.source);
        let fetcher: Weak<FetcherInner> = Arc::downgrade(&self.inner);

        self.inner.runtime.spawn(async move {
            let filter = Filter::settings(pubkey.clone());
            let mut events = match source.subscribe(&relays, &filter).await {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!(pubkey = pubkey.short(), "Settings request failed: {e}");
                    return;
                }
            };
            while let Some(event) = events.recv().await {
                let Some(fetcher) = fetcher.upgrade() else {
                    break;
                };
                fetcher.handle_event(event);
            }
            tracing::trace!(pubkey = pubkey.short(), "Settings subscription ended");
        })
    }
}

impl SettingsFetcher for UserAppSettings {
    fn request_app_settings(
        &self,
        pubkey: &PublicKey,
        relays: &RelaySet,
        options: RequestOptions,
    ) -> Subject<AppSettings> {
        let mut cache = lock(&self.inner.cache);
        let entry = cache
            .entry(pubkey.clone())
            .or_insert_with(CachedSettings::new);
        let subject = entry.subject.clone();

        if relays.is_empty() {
            tracing::debug!(pubkey = pubkey.short(), "No relays to request settings from");
            return subject;
        }

        let to_request = if options.always_request {
            for task in entry.tasks.drain(..) {
                task.abort();
            }
            entry.requested = RelaySet::new();
            relays.clone()
        } else {
            relays
                .iter()
                .filter(|relay| !entry.requested.contains(relay))
                .cloned()
                .collect::<RelaySet>()
        };
        if to_request.is_empty() {
            return subject;
        }

        tracing::debug!(
            pubkey = pubkey.short(),
            relays = to_request.len(),
            force = options.always_request,
            "Requesting settings"
        );
        for relay in &to_request {
            entry.requested.insert(relay.clone());
        }
        entry.tasks.retain(|task| !task.is_finished());
        let task = self.spawn_request(pubkey.clone(), to_request);
        entry.tasks.push(task);

        subject
    }
}

impl std::fmt::Debug for UserAppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAppSettings")
            .field("accounts", &lock(&self.inner.cache).len())
            .finish()
    }
}
