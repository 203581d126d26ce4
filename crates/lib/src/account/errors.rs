//! Error types for the account system

use thiserror::Error;

use crate::keys::PublicKey;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account not found: {pubkey}")]
    NotFound { pubkey: PublicKey },

    #[error("No account is active")]
    NoActiveAccount,

    #[error("Invalid public key '{key}': {reason}")]
    InvalidPublicKey { key: String, reason: String },
}

impl AccountError {
    /// Check if this error indicates an account was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccountError::NotFound { .. })
    }

    /// Check if the operation needed a logged-in account.
    pub fn is_no_active_account(&self) -> bool {
        matches!(self, AccountError::NoActiveAccount)
    }
}

impl From<AccountError> for crate::Error {
    fn from(err: AccountError) -> Self {
        crate::Error::Account(err)
    }
}
