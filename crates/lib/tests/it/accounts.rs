//! The account store on disk, and resolving from it after a restart.

use std::sync::Arc;

use relaydeck::{
    Account, AccountService, AppSettings, ResolutionState,
    relay::MemoryRelayPool,
    settings::{ColorMode, PageWidth},
};
use serde_json::json;

use crate::helpers::*;

fn local() -> AppSettings {
    AppSettings {
        color_mode: ColorMode::Dark,
        muted_words: "crypto, politics".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_restart_resumes_active_account() {
    let dir = tempfile::tempdir().unwrap();
    let pool = Arc::new(MemoryRelayPool::new());

    {
        let h = Harness::open(dir.path(), pool.clone()).await;
        h.accounts
            .add_account(Account::new(key(ALICE)).with_local_settings(local()))
            .await
            .unwrap();
        h.accounts.add_account(Account::readonly(key(BOB))).await.unwrap();
        h.accounts.switch_account(&key(ALICE)).await.unwrap();
    }

    let remote = AppSettings {
        max_page_width: PageWidth::Sm,
        ..Default::default()
    };
    pool.publish(&relay(RELAY_A), settings_event(ALICE, &remote, 100))
        .await;

    let h = Harness::open(dir.path(), pool).await;
    assert_eq!(
        h.service.state(),
        ResolutionState::AwaitingRemote { pubkey: key(ALICE) }
    );
    assert_eq!(h.accounts.active().unwrap().pubkey, key(ALICE));
    assert_eq!(h.accounts.accounts().await.len(), 2);
    assert!(h.accounts.get(&key(BOB)).await.unwrap().readonly);

    h.wait_for_settings(|s| *s == remote).await;
}

#[tokio::test]
async fn test_store_file_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    let accounts = AccountService::open(&path, Arc::new(clock_at(1_700_000_000)))
        .await
        .unwrap();
    accounts
        .add_account(Account::new(key(ALICE)).with_local_settings(local()))
        .await
        .unwrap();
    accounts.switch_account(&key(ALICE)).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(raw["current"], json!(ALICE));
    let stored = &raw["accounts"][0];
    assert_eq!(stored["pubkey"], json!(ALICE));
    assert_eq!(stored["readonly"], json!(false));
    assert_eq!(stored["addedAt"], json!(1_700_000_000u64));
    assert_eq!(stored["localSettings"]["colorMode"], json!("dark"));
    assert_eq!(stored["localSettings"]["mutedWords"], json!("crypto, politics"));
}

#[tokio::test]
async fn test_logout_is_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    let clock = Arc::new(clock_at(1_700_000_000));

    let accounts = AccountService::open(&path, clock.clone()).await.unwrap();
    accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    accounts.switch_account(&key(ALICE)).await.unwrap();
    accounts.logout().await.unwrap();

    let reopened = AccountService::open(&path, clock).await.unwrap();
    assert!(reopened.active().is_none());
    assert_eq!(reopened.accounts().await.len(), 1);
}

#[tokio::test]
async fn test_legacy_local_settings_are_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    let store = json!({
        "accounts": [{
            "pubkey": ALICE,
            "localSettings": {
                "colorMode": "light",
                "mutedWords": ["bitcoin", "football"],
                "autoShowImages": false,
                "autoShowVideos": false
            }
        }],
        "current": ALICE
    });
    std::fs::write(&path, store.to_string()).unwrap();

    let h = Harness::open(dir.path(), Arc::new(MemoryRelayPool::new())).await;
    let account = h.accounts.active().unwrap();
    let settings = account.local_settings.unwrap();

    assert_eq!(settings.version, relaydeck::settings::CURRENT_VERSION);
    assert_eq!(settings.color_mode, ColorMode::Light);
    assert_eq!(settings.muted_word_list(), vec!["bitcoin", "football"]);
    assert!(!settings.auto_show_media);
}

#[tokio::test]
async fn test_unreadable_local_settings_keep_the_account() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    let store = json!({
        "accounts": [{
            "pubkey": ALICE,
            "localSettings": { "version": 99 }
        }]
    });
    std::fs::write(&path, store.to_string()).unwrap();

    let accounts = AccountService::open(&path, Arc::new(clock_at(0)))
        .await
        .unwrap();

    let account = accounts.get(&key(ALICE)).await.unwrap();
    assert!(account.local_settings.is_none());
}

#[tokio::test]
async fn test_unknown_store_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    std::fs::write(&path, r#"{"_v": 7, "accounts": []}"#).unwrap();

    let err = AccountService::open(&path, Arc::new(clock_at(0)))
        .await
        .unwrap_err();

    assert_eq!(err.module(), "serialize");
    assert!(err.to_string().contains("unsupported account store version"));
}

#[tokio::test]
async fn test_detached_store_records_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let remote = AppSettings {
        max_page_width: PageWidth::Sm,
        ..Default::default()
    };
    let pool = Arc::new(MemoryRelayPool::new());
    pool.publish(&relay(RELAY_A), settings_event(ALICE, &remote, 100))
        .await;

    {
        let h = Harness::open(dir.path(), pool.clone()).await;
        h.accounts
            .add_account(Account::new(key(ALICE)).with_local_settings(local()))
            .await
            .unwrap();
        h.accounts.switch_account(&key(ALICE)).await.unwrap();
    }

    let path = dir.path().join("accounts.json");
    let stored = AccountService::open(&path, Arc::new(clock_at(1_700_000_000)))
        .await
        .unwrap();
    let active = stored.active().unwrap();

    let h = Harness::with_accounts(Arc::new(stored.detached().await), pool);
    assert_eq!(h.service.state(), ResolutionState::NoIdentity);

    h.accounts.switch_account(&active.pubkey).await.unwrap();
    h.wait_for_settings(|s| *s == remote).await;

    let defaults = AppSettings::default();
    assert_eq!(h.seen(), vec![defaults.clone(), local(), defaults, remote]);

    // The store on disk still names Alice and was not rewritten
    let reopened = AccountService::open(&path, Arc::new(clock_at(0)))
        .await
        .unwrap();
    assert_eq!(reopened.active().unwrap().pubkey, key(ALICE));
}
