//! Relays: addresses, relay sets, the client's relay list and the event
//! source seam.
//!
//! The transport that actually talks to relays lives outside this crate and
//! plugs in through [`EventSource`]. [`MemoryRelayPool`] is an in-process
//! implementation used by tests and the CLI.

pub mod errors;
pub mod memory;
pub mod source;

use std::{fmt, str::FromStr, sync::Mutex};

use serde::{Deserialize, Serialize};

pub use errors::RelayError;
pub use memory::MemoryRelayPool;
pub use source::{EventSource, Filter};

use crate::{
    Result,
    constants::DEFAULT_RELAYS,
    reactive::{PersistentSubject, ReadonlySubject, lock},
};

/// A normalized relay address (`ws://` or `wss://`).
///
/// Scheme and host are lowercased and a bare trailing slash is removed, so
/// `wss://Relay.Example/` and `wss://relay.example` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelayUrl(String);

impl RelayUrl {
    /// Parse and normalize a relay address.
    pub fn parse(input: &str) -> std::result::Result<Self, RelayError> {
        let url = url::Url::parse(input.trim()).map_err(|e| RelayError::InvalidUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(RelayError::UnsupportedScheme {
                    url: input.to_string(),
                    scheme: other.to_string(),
                });
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(RelayError::InvalidUrl {
                url: input.to_string(),
                reason: "missing host".to_string(),
            });
        }

        let mut normalized = url.to_string();
        if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
            normalized.pop();
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RelayUrl {
    type Err = RelayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RelayUrl {
    type Error = RelayError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RelayUrl> for String {
    fn from(url: RelayUrl) -> Self {
        url.0
    }
}

/// An ordered set of relays without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RelayUrl>", into = "Vec<RelayUrl>")]
pub struct RelaySet {
    relays: Vec<RelayUrl>,
}

impl RelaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every address in `urls`.
    pub fn parse<'a>(urls: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut set = Self::new();
        for url in urls {
            set.insert(RelayUrl::parse(url)?);
        }
        Ok(set)
    }

    /// Add a relay. Returns `false` if it was already present.
    pub fn insert(&mut self, relay: RelayUrl) -> bool {
        if self.contains(&relay) {
            return false;
        }
        self.relays.push(relay);
        true
    }

    /// Remove a relay. Returns `false` if it was not present.
    pub fn remove(&mut self, relay: &RelayUrl) -> bool {
        let before = self.relays.len();
        self.relays.retain(|r| r != relay);
        self.relays.len() != before
    }

    pub fn contains(&self, relay: &RelayUrl) -> bool {
        self.relays.contains(relay)
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RelayUrl> {
        self.relays.iter()
    }
}

impl From<Vec<RelayUrl>> for RelaySet {
    fn from(relays: Vec<RelayUrl>) -> Self {
        relays.into_iter().collect()
    }
}

impl From<RelaySet> for Vec<RelayUrl> {
    fn from(set: RelaySet) -> Self {
        set.relays
    }
}

impl FromIterator<RelayUrl> for RelaySet {
    fn from_iter<I: IntoIterator<Item = RelayUrl>>(iter: I) -> Self {
        let mut set = Self::new();
        for relay in iter {
            set.insert(relay);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RelaySet {
    type Item = &'a RelayUrl;
    type IntoIter = std::slice::Iter<'a, RelayUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.relays.iter()
    }
}

/// The client's relay list.
///
/// Only read relays matter to the settings subsystem; they are published
/// through a reactive container.
pub struct ClientRelays {
    read_relays: PersistentSubject<RelaySet>,
    write_lock: Mutex<()>,
}

impl ClientRelays {
    pub fn new(read_relays: RelaySet) -> Self {
        Self {
            read_relays: PersistentSubject::new(read_relays),
            write_lock: Mutex::new(()),
        }
    }

    /// A relay list made of [`DEFAULT_RELAYS`].
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(RelaySet::parse(DEFAULT_RELAYS.iter().copied())?))
    }

    /// The read relays, as a container that follows every change.
    pub fn read_relays(&self) -> ReadonlySubject<RelaySet> {
        self.read_relays.readonly()
    }

    /// Replace the read relays.
    pub fn set_read_relays(&self, relays: RelaySet) {
        let _guard = lock(&self.write_lock);
        tracing::debug!(count = relays.len(), "Read relays replaced");
        self.read_relays.set(relays);
    }

    /// Add a read relay. Returns `false` if it was already present.
    pub fn add_relay(&self, relay: RelayUrl) -> bool {
        let _guard = lock(&self.write_lock);
        let mut relays = self.read_relays.get();
        let added = relays.insert(relay);
        if added {
            self.read_relays.set(relays);
        }
        added
    }

    /// Remove a read relay. Returns `false` if it was not present.
    pub fn remove_relay(&self, relay: &RelayUrl) -> bool {
        let _guard = lock(&self.write_lock);
        let mut relays = self.read_relays.get();
        let removed = relays.remove(relay);
        if removed {
            self.read_relays.set(relays);
        }
        removed
    }
}

impl std::fmt::Debug for ClientRelays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRelays")
            .field("read_relays", &self.read_relays.get())
            .finish()
    }
}
