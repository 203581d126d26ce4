//! Settings resolution command.
//!
//! Wires the resolution service to a relay pool loaded from a fixture file,
//! activates the stored account, lets the fetcher run for a while and reports
//! every value the authoritative settings went through.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use relaydeck::{
    AppSettings, AppSettingsService, ResolutionState, SystemClock, UserAppSettings,
};

use crate::backend::{open_accounts, open_pool, read_relays};
use crate::cli::ResolveArgs;
use crate::output::{OutputFormat, SETTINGS_HEADERS, print_table, settings_row};

/// Run the resolve command
pub async fn run(args: &ResolveArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve against a copy of the store so the recorder is attached before
    // the stored account activates and nothing is written back.
    let stored = open_accounts(&args.store).await?;
    let active = stored.active();
    let accounts = Arc::new(stored.detached().await);

    let pool = Arc::new(open_pool(args).await?);
    let relays = Arc::new(read_relays(args, &pool).await?);
    let fetcher = Arc::new(UserAppSettings::new(
        pool.clone(),
        tokio::runtime::Handle::current(),
    ));

    let service = AppSettingsService::new(
        Arc::clone(&accounts),
        relays,
        fetcher,
        Arc::new(SystemClock),
    );

    let observed = Arc::new(Mutex::new(Vec::<AppSettings>::new()));
    let sink = Arc::clone(&observed);
    let recorder = service.settings().subscribe(move |settings: &AppSettings| {
        if let Ok(mut values) = sink.lock() {
            values.push(settings.clone());
        }
    });

    match &active {
        Some(account) => accounts.switch_account(&account.pubkey).await?,
        None => tracing::info!("No active account, resolving defaults"),
    }

    tokio::time::sleep(Duration::from_millis(args.wait_ms)).await;
    drop(recorder);

    let state = service.state();
    let settings = service.settings().get();
    let observed = observed.lock().map(|v| v.clone()).unwrap_or_default();

    match format {
        OutputFormat::Human => {
            println!("State:       {}", describe(&state));
            println!("Observed:    {} value(s)", observed.len());
            println!();

            let mut headers = vec!["#"];
            headers.extend(SETTINGS_HEADERS);
            let rows: Vec<Vec<String>> = observed
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let mut row = vec![i.to_string()];
                    row.extend(settings_row(value));
                    row
                })
                .collect();
            print_table(&headers, &rows);
            println!();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "state": describe(&state),
                "pubkey": pubkey(&state),
                "observed": observed,
                "settings": settings,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

fn describe(state: &ResolutionState) -> &'static str {
    match state {
        ResolutionState::NoIdentity => "no-identity",
        ResolutionState::AwaitingRemote { .. } => "awaiting-remote",
        ResolutionState::WithRemote { .. } => "with-remote",
    }
}

fn pubkey(state: &ResolutionState) -> Option<&str> {
    match state {
        ResolutionState::NoIdentity => None,
        ResolutionState::AwaitingRemote { pubkey } | ResolutionState::WithRemote { pubkey } => {
            Some(pubkey.as_str())
        }
    }
}
