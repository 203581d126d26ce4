//! Account public keys.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::account::AccountError;

/// Length of a public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// An account identifier: a 32-byte public key, held as lowercase hex.
///
/// Only the shape is checked here. Whether the bytes are a valid curve point
/// is the signer's concern.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// Parse a hex-encoded public key. Uppercase input is normalized.
    pub fn parse(input: &str) -> Result<Self, AccountError> {
        let normalized = input.trim().to_ascii_lowercase();
        let bytes = hex::decode(&normalized).map_err(|e| AccountError::InvalidPublicKey {
            key: input.to_string(),
            reason: e.to_string(),
        })?;
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(AccountError::InvalidPublicKey {
                key: input.to_string(),
                reason: format!("expected {PUBLIC_KEY_SIZE} bytes, got {}", bytes.len()),
            });
        }
        Ok(Self(normalized))
    }

    /// The hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PublicKey {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = AccountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}
