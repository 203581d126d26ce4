//! Settings resolution against the in-memory relay pool.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use relaydeck::{
    Account, AppSettings, RequestOptions, ResolutionState, SettingsFetcher,
    relay::{MemoryRelayPool, RelaySet},
    settings::{ColorMode, LightningPayMode, PageWidth},
};

use crate::helpers::*;

fn local() -> AppSettings {
    AppSettings {
        color_mode: ColorMode::Dark,
        ..Default::default()
    }
}

fn remote() -> AppSettings {
    AppSettings {
        max_page_width: PageWidth::Lg,
        lightning_pay_mode: LightningPayMode::Webln,
        ..Default::default()
    }
}

async fn pool_with(events: &[(&str, relaydeck::event::Event)]) -> Arc<MemoryRelayPool> {
    let pool = Arc::new(MemoryRelayPool::new());
    for (url, event) in events {
        pool.publish(&relay(url), event.clone()).await;
    }
    pool
}

#[tokio::test]
async fn test_login_reaches_remote_settings() {
    let pool = pool_with(&[(RELAY_A, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts
        .add_account(Account::new(key(ALICE)).with_local_settings(local()))
        .await
        .unwrap();

    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;

    let defaults = AppSettings::default();
    assert_eq!(h.seen(), vec![defaults.clone(), local(), defaults, remote()]);
    assert_eq!(
        h.service.state(),
        ResolutionState::WithRemote { pubkey: key(ALICE) }
    );
}

#[tokio::test]
async fn test_missing_remote_settings_converge_to_defaults() {
    let h = Harness::new();
    h.accounts
        .add_account(Account::new(key(ALICE)).with_local_settings(local()))
        .await
        .unwrap();

    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    settle().await;

    assert_eq!(h.current(), AppSettings::default());
    assert_eq!(
        h.service.state(),
        ResolutionState::AwaitingRemote { pubkey: key(ALICE) }
    );
    assert_eq!(h.pool.request_count().await, 1);
}

#[tokio::test]
async fn test_newer_remote_settings_follow_live() {
    let pool = pool_with(&[(RELAY_A, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;

    let edited = AppSettings {
        muted_words: "spoilers".to_string(),
        ..remote()
    };
    h.pool
        .publish(&relay(RELAY_A), settings_event(ALICE, &edited, 200))
        .await;
    h.wait_for_settings(|s| s.muted_words == "spoilers").await;

    // Older events never replace newer ones
    h.pool
        .publish(&relay(RELAY_A), settings_event(ALICE, &local(), 150))
        .await;
    settle().await;
    assert_eq!(h.current(), edited);
}

#[tokio::test]
async fn test_switching_accounts_isolates_late_remote_settings() {
    let pool = pool_with(&[(RELAY_A, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts
        .add_account(Account::new(key(BOB)).with_local_settings(local()))
        .await
        .unwrap();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;
    h.clear_seen();

    h.accounts.switch_account(&key(BOB)).await.unwrap();
    let late = AppSettings {
        color_mode: ColorMode::Light,
        ..remote()
    };
    h.pool
        .publish(&relay(RELAY_A), settings_event(ALICE, &late, 300))
        .await;
    settle().await;

    assert_eq!(h.seen(), vec![local(), AppSettings::default()]);
    assert_eq!(
        h.service.state(),
        ResolutionState::AwaitingRemote { pubkey: key(BOB) }
    );
    // The late event still reached Alice's cache, just not the active settings
    assert_eq!(h.fetcher.cached(&key(ALICE)), Some(late));
}

#[tokio::test]
async fn test_logout_returns_to_defaults() {
    let pool = pool_with(&[(RELAY_A, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;

    h.accounts.logout().await.unwrap();
    h.pool
        .publish(&relay(RELAY_A), settings_event(ALICE, &local(), 200))
        .await;
    settle().await;

    assert_eq!(h.current(), AppSettings::default());
    assert_eq!(h.service.state(), ResolutionState::NoIdentity);
}

#[tokio::test]
async fn test_every_activation_queries_relays_again() {
    let pool = pool_with(&[(RELAY_A, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.add_account(Account::new(key(BOB))).await.unwrap();

    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;
    h.accounts.switch_account(&key(BOB)).await.unwrap();
    settle().await;
    assert_eq!(h.current(), AppSettings::default());

    // Alice's settings are cached by now and apply as soon as she is back
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    assert_eq!(h.current(), remote());
    settle().await;
    assert_eq!(h.pool.request_count().await, 3);
}

#[tokio::test]
async fn test_relay_changes_apply_on_next_activation() {
    let pool = pool_with(&[(RELAY_B, settings_event(ALICE, &remote(), 100))]).await;
    let h = Harness::with_pool(pool);
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    settle().await;
    assert_eq!(h.current(), AppSettings::default());

    h.relays.add_relay(relay(RELAY_B));
    settle().await;
    assert_eq!(h.current(), AppSettings::default());
    assert_eq!(h.pool.request_count().await, 1);

    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    h.wait_for_settings(|s| *s == remote()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_switching_under_concurrent_remote_updates() {
    const CYCLES: usize = 300;
    const WRITERS: usize = 3;

    let h = Harness::new();
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.add_account(Account::new(key(BOB))).await.unwrap();

    // Same subject the service connects to whenever Alice is active
    let alice_remote =
        h.fetcher
            .request_app_settings(&key(ALICE), &RelaySet::new(), RequestOptions::default());

    let bob_active = Arc::new(AtomicBool::new(false));
    let from_alice = Arc::new(AtomicUsize::new(0));
    let leaked = Arc::new(AtomicUsize::new(0));
    let _watch = {
        let bob_active = Arc::clone(&bob_active);
        let from_alice = Arc::clone(&from_alice);
        let leaked = Arc::clone(&leaked);
        h.service.settings().subscribe(move |s: &AppSettings| {
            if s.muted_words.starts_with("alice") {
                from_alice.fetch_add(1, Ordering::SeqCst);
                if bob_active.load(Ordering::SeqCst) {
                    leaked.fetch_add(1, Ordering::SeqCst);
                }
            }
        })
    };

    let stop = Arc::new(AtomicBool::new(false));
    let writers: Vec<_> = (0..WRITERS)
        .map(|n| {
            let remote = alice_remote.clone();
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut i = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    remote.set(AppSettings {
                        muted_words: format!("alice {n} {i}"),
                        ..Default::default()
                    });
                    i += 1;
                    if i % 64 == 0 {
                        std::thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let switching = tokio::spawn({
        let accounts = Arc::clone(&h.accounts);
        let bob_active = Arc::clone(&bob_active);
        async move {
            for _ in 0..CYCLES {
                bob_active.store(false, Ordering::SeqCst);
                accounts.switch_account(&key(ALICE)).await.unwrap();
                accounts.switch_account(&key(BOB)).await.unwrap();
                bob_active.store(true, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        }
    });
    let finished = tokio::time::timeout(Duration::from_secs(20), switching).await;
    stop.store(true, Ordering::Relaxed);
    finished
        .expect("account switching did not finish in time")
        .unwrap();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(leaked.load(Ordering::SeqCst), 0);
    assert!(from_alice.load(Ordering::SeqCst) > 0);
    assert!(!h.current().muted_words.starts_with("alice"));
    assert_eq!(
        h.service.state(),
        ResolutionState::AwaitingRemote { pubkey: key(BOB) }
    );
}
