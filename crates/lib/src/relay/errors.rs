//! Error types for relay handling.

use thiserror::Error;

/// Errors that can occur while parsing relay addresses or talking to relays.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay address is not a URL.
    #[error("Invalid relay URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The relay address uses something other than `ws` or `wss`.
    #[error("Unsupported relay scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },
}

impl RelayError {
    /// Check if this error is about a malformed relay address.
    pub fn is_address_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidUrl { .. } | RelayError::UnsupportedScheme { .. }
        )
    }
}

impl From<RelayError> for crate::Error {
    fn from(err: RelayError) -> Self {
        crate::Error::Relay(err)
    }
}
