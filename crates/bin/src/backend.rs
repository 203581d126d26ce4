//! Builds the library services from CLI arguments.

use std::{path::PathBuf, sync::Arc};

use relaydeck::{
    AccountService, SystemClock,
    constants::{ACCOUNTS_FILE, DEFAULT_RELAYS},
    relay::{ClientRelays, MemoryRelayPool, RelaySet},
};

use crate::cli::{ResolveArgs, StoreArgs};

/// Open the account store in the configured data directory.
pub async fn open_accounts(args: &StoreArgs) -> Result<AccountService, Box<dyn std::error::Error>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = data_dir.join(ACCOUNTS_FILE);
    tracing::debug!("Using account store at {}", path.display());
    Ok(AccountService::open(path, Arc::new(SystemClock)).await?)
}

/// Load the relay fixture, or start with an empty pool without one.
pub async fn open_pool(args: &ResolveArgs) -> Result<MemoryRelayPool, Box<dyn std::error::Error>> {
    match &args.relays_file {
        Some(path) => Ok(MemoryRelayPool::load_from_file(path).await?),
        None => {
            tracing::warn!("No relay fixture given, remote settings will not be found");
            Ok(MemoryRelayPool::new())
        }
    }
}

/// The read relays for this run.
///
/// Explicit `--relay` flags win, then the relays of the fixture, then the
/// built-in defaults.
pub async fn read_relays(
    args: &ResolveArgs,
    pool: &MemoryRelayPool,
) -> Result<ClientRelays, Box<dyn std::error::Error>> {
    if !args.relays.is_empty() {
        let relays = RelaySet::parse(args.relays.iter().map(String::as_str))?;
        return Ok(ClientRelays::new(relays));
    }
    let fixture_relays = pool.relays().await;
    if !fixture_relays.is_empty() {
        return Ok(ClientRelays::new(fixture_relays));
    }
    tracing::debug!(count = DEFAULT_RELAYS.len(), "Using default relays");
    Ok(ClientRelays::with_defaults()?)
}
