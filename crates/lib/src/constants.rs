//! Constants used throughout the relaydeck library.
//!
//! Event kinds and identifiers here are part of the data written to relays;
//! changing them orphans every settings event already published.

/// Event kind for application-specific replaceable data.
pub const APP_SETTINGS_KIND: u16 = 30078;

/// Value of the `d` tag that addresses this client's settings event.
pub const SETTINGS_IDENTIFIER: &str = "relaydeck-settings";

/// Tag name carrying the replaceable-event identifier.
pub const IDENTIFIER_TAG: &str = "d";

/// Relays used when a client has not configured any.
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.primal.net",
];

/// File name of the account store inside the data directory.
pub const ACCOUNTS_FILE: &str = "accounts.json";

/// Buffer size of a single relay subscription channel.
pub const SUBSCRIPTION_BUFFER: usize = 64;
