//!
//! relaydeck: account-scoped settings for a relay-based social client.
//!
//! The crate resolves one authoritative settings value for whichever account
//! is active, combining settings saved on the device with the newest settings
//! event found on the account's relays.
//!
//! ## Core Concepts
//!
//! * **Reactive containers (`reactive`)**: Observable value holders with
//!   replay-on-subscribe semantics. A container can be *connected* to another
//!   so that it forwards everything the source emits.
//! * **Accounts (`account::AccountService`)**: The accounts known to this
//!   device, the active one, and the settings each one last saved locally.
//! * **Relays (`relay`)**: Relay addresses, the client's read relays and the
//!   [`relay::EventSource`] seam to the transport.
//! * **Settings (`settings::AppSettings`)**: The versioned settings schema and
//!   the migration chain that brings older records up to date.
//! * **Fetcher (`fetcher::UserAppSettings`)**: Looks up an account's settings
//!   event on its relays and keeps following it.
//! * **Resolution (`app_settings::AppSettingsService`)**: Follows the active
//!   account and publishes the authoritative settings.

pub mod account;
pub mod app_settings;
pub mod clock;
pub mod constants;
pub mod event;
pub mod fetcher;
pub mod keys;
pub mod reactive;
pub mod relay;
pub mod settings;

pub use account::{Account, AccountService};
pub use app_settings::{AppSettingsService, ResolutionState};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use fetcher::{RequestOptions, SettingsFetcher, UserAppSettings};
pub use keys::PublicKey;
pub use settings::AppSettings;

/// Result type used throughout the relaydeck library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the relaydeck library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured account errors from the account module
    #[error(transparent)]
    Account(account::AccountError),

    /// Structured relay errors from the relay module
    #[error(transparent)]
    Relay(relay::RelayError),

    /// Structured settings errors from the settings module
    #[error(transparent)]
    Settings(settings::SettingsError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Account(_) => "account",
            Error::Relay(_) => "relay",
            Error::Settings(_) => "settings",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Account(account_err) => account_err.is_not_found(),
            Error::Io(io_err) => io_err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error means an operation needed an active account.
    pub fn is_no_active_account(&self) -> bool {
        match self {
            Error::Account(account_err) => account_err.is_no_active_account(),
            _ => false,
        }
    }

    /// Check if this error is account-related.
    pub fn is_account_error(&self) -> bool {
        matches!(self, Error::Account(_))
    }

    /// Check if this error is relay-related.
    pub fn is_relay_error(&self) -> bool {
        matches!(self, Error::Relay(_))
    }

    /// Check if this error is about a malformed relay address.
    pub fn is_address_error(&self) -> bool {
        match self {
            Error::Relay(relay_err) => relay_err.is_address_error(),
            _ => false,
        }
    }

    /// Check if this error is settings-related.
    pub fn is_settings_error(&self) -> bool {
        matches!(self, Error::Settings(_))
    }

    /// Check if this error is a settings record that could not be decoded.
    pub fn is_decode_error(&self) -> bool {
        match self {
            Error::Settings(settings_err) => settings_err.is_decode_error(),
            Error::Serialize(_) => true,
            _ => false,
        }
    }

    /// Check if this error is a settings schema version the client cannot read.
    pub fn is_version_error(&self) -> bool {
        match self {
            Error::Settings(settings_err) => settings_err.is_version_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
