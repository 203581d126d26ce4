//! Shared setup for the integration tests.
//!
//! [`Harness`] wires the full stack the way a client does: an account
//! service, the read relays, a [`MemoryRelayPool`] standing in for the
//! network, the fetcher on top of it and the settings service. Every value
//! the settings service publishes is recorded.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use relaydeck::{
    AccountService, AppSettings, AppSettingsService, FixedClock, PublicKey, UserAppSettings,
    event::{Event, build_settings_event},
    reactive::Subscription,
    relay::{ClientRelays, MemoryRelayPool, RelaySet, RelayUrl},
};

pub const ALICE: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
pub const BOB: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";

pub const RELAY_A: &str = "wss://a.relay.example";
pub const RELAY_B: &str = "wss://b.relay.example";

// ===== TIME =====

/// A clock pinned at `secs` seconds since the epoch.
pub fn clock_at(secs: u64) -> FixedClock {
    FixedClock::new(secs * 1000)
}

// ===== VALUES =====

pub fn key(hex: &str) -> PublicKey {
    PublicKey::parse(hex).expect("valid test key")
}

pub fn relay(url: &str) -> RelayUrl {
    RelayUrl::parse(url).expect("valid test relay")
}

pub fn relay_set(urls: &[&str]) -> RelaySet {
    RelaySet::parse(urls.iter().copied()).expect("valid test relays")
}

/// A settings event for `author`, created at `created_at` (seconds).
pub fn settings_event(author: &str, settings: &AppSettings, created_at: u64) -> Event {
    build_settings_event(settings, &clock_at(created_at))
        .expect("settings encode")
        .into_unsigned(key(author))
        .into_signed(String::new())
}

// ===== HARNESS =====

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub accounts: Arc<AccountService>,
    pub relays: Arc<ClientRelays>,
    pub pool: Arc<MemoryRelayPool>,
    pub fetcher: Arc<UserAppSettings>,
    pub service: AppSettingsService,
    seen: Arc<Mutex<Vec<AppSettings>>>,
    _recorder: Subscription,
}

impl Harness {
    /// In-memory accounts, read relays `RELAY_A`, empty pool.
    pub fn new() -> Self {
        let clock = Arc::new(clock_at(1_700_000_000));
        let accounts = Arc::new(AccountService::new(clock.clone()));
        Self::build(clock, accounts, Arc::new(MemoryRelayPool::new()))
    }

    /// Accounts stored in `dir`.
    pub async fn open(dir: &Path, pool: Arc<MemoryRelayPool>) -> Self {
        let clock = Arc::new(clock_at(1_700_000_000));
        let accounts = AccountService::open(dir.join("accounts.json"), clock.clone())
            .await
            .expect("open account store");
        Self::build(clock, Arc::new(accounts), pool)
    }

    pub fn with_pool(pool: Arc<MemoryRelayPool>) -> Self {
        let clock = Arc::new(clock_at(1_700_000_000));
        let accounts = Arc::new(AccountService::new(clock.clone()));
        Self::build(clock, accounts, pool)
    }

    /// Resolve for an account service built elsewhere.
    pub fn with_accounts(accounts: Arc<AccountService>, pool: Arc<MemoryRelayPool>) -> Self {
        Self::build(Arc::new(clock_at(1_700_000_000)), accounts, pool)
    }

    fn build(
        clock: Arc<FixedClock>,
        accounts: Arc<AccountService>,
        pool: Arc<MemoryRelayPool>,
    ) -> Self {
        let relays = Arc::new(ClientRelays::new(relay_set(&[RELAY_A])));
        let fetcher = Arc::new(UserAppSettings::new(
            pool.clone(),
            tokio::runtime::Handle::current(),
        ));
        let service = AppSettingsService::new(
            accounts.clone(),
            relays.clone(),
            fetcher.clone(),
            clock.clone(),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let recorder = service
            .settings()
            .subscribe(move |s: &AppSettings| sink.lock().unwrap().push(s.clone()));

        Self {
            clock,
            accounts,
            relays,
            pool,
            fetcher,
            service,
            seen,
            _recorder: recorder,
        }
    }

    /// Every value published since the harness was built (or last cleared).
    pub fn seen(&self) -> Vec<AppSettings> {
        self.seen.lock().unwrap().clone()
    }

    pub fn clear_seen(&self) {
        self.seen.lock().unwrap().clear();
    }

    pub fn current(&self) -> AppSettings {
        self.service.settings().get()
    }

    /// Wait until the published settings satisfy `cond`.
    pub async fn wait_for_settings(&self, cond: impl Fn(&AppSettings) -> bool) {
        let settings = self.service.settings();
        wait_until(|| settings.with(&cond)).await;
    }
}

/// Poll `cond` until it holds, failing the test after five seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Give spawned fetch tasks time to deliver anything they are going to.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
