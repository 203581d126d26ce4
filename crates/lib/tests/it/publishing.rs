//! Settings edited on this device, published and read back.

use relaydeck::{
    Account, AppSettings,
    settings::{ColorMode, LightningPayMode},
};

use crate::helpers::*;

#[tokio::test]
async fn test_replaced_settings_round_trip_through_relays() {
    let h = Harness::new();
    h.accounts.add_account(Account::new(key(ALICE))).await.unwrap();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();

    let edited = AppSettings {
        color_mode: ColorMode::Dark,
        lightning_pay_mode: LightningPayMode::External,
        ..Default::default()
    };
    h.clock.advance_secs(60);
    let template = h
        .service
        .replace_settings(edited.clone())
        .await
        .unwrap()
        .expect("signing account gets a template");
    assert_eq!(h.current(), edited);
    assert_eq!(template.created_at, 1_700_000_060);

    let event = template.into_unsigned(key(ALICE)).into_signed(String::new());
    assert!(h.pool.publish(&relay(RELAY_A), event).await);

    // The relay echoes the event back through the live subscription
    wait_until(|| h.fetcher.cached(&key(ALICE)) == Some(edited.clone())).await;
    h.wait_for_settings(|s| *s == edited).await;

    // A later login starts from the saved copy and ends on the relay copy
    h.accounts.logout().await.unwrap();
    h.clear_seen();
    h.accounts.switch_account(&key(ALICE)).await.unwrap();
    assert_eq!(
        h.seen(),
        vec![edited.clone(), AppSettings::default(), edited.clone()]
    );
}

#[tokio::test]
async fn test_readonly_accounts_only_save_locally() {
    let h = Harness::new();
    h.accounts.add_account(Account::readonly(key(BOB))).await.unwrap();
    h.accounts.switch_account(&key(BOB)).await.unwrap();

    let edited = AppSettings {
        hide_usernames: true,
        ..Default::default()
    };
    let template = h.service.replace_settings(edited.clone()).await.unwrap();

    assert!(template.is_none());
    assert_eq!(h.current(), edited);
    let stored = h.accounts.get(&key(BOB)).await.unwrap();
    assert_eq!(stored.local_settings, Some(edited));
}

#[tokio::test]
async fn test_replace_without_account_fails() {
    let h = Harness::new();
    let err = h
        .service
        .replace_settings(AppSettings::default())
        .await
        .unwrap_err();
    assert!(err.is_no_active_account());
    assert_eq!(h.current(), AppSettings::default());
}
