//! Relay events as seen by the settings subsystem.
//!
//! Events arrive already parsed and verified by the transport layer; this
//! module only reads the fields it needs and builds the unsigned template of
//! an outgoing settings event.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    Clock, Result,
    constants::{APP_SETTINGS_KIND, IDENTIFIER_TAG, SETTINGS_IDENTIFIER},
    keys::PublicKey,
    settings::{AppSettings, SettingsError, encode_settings, parse_settings},
};

/// A signed event received from a relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Hex event ID
    pub id: String,
    pub pubkey: PublicKey,
    /// Unix timestamp in seconds
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    /// Hex signature
    #[serde(default)]
    pub sig: String,
}

impl Event {
    /// Value of the first tag named `name`.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some(name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }

    /// The replaceable-event identifier (`d` tag).
    pub fn identifier(&self) -> Option<&str> {
        self.tag_value(IDENTIFIER_TAG)
    }

    /// Whether this is a settings event of this client.
    pub fn is_settings_event(&self) -> bool {
        self.kind == APP_SETTINGS_KIND && self.identifier() == Some(SETTINGS_IDENTIFIER)
    }

    /// Position of this event in replaceable-event ordering.
    pub fn version(&self) -> EventVersion {
        EventVersion {
            created_at: self.created_at,
            id: self.id.clone(),
        }
    }
}

/// Ordering key between two versions of the same replaceable event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventVersion {
    pub created_at: u64,
    pub id: String,
}

impl EventVersion {
    /// Whether `self` replaces `other`: later `created_at` wins, and on a tie
    /// the lexicographically smaller ID wins.
    pub fn supersedes(&self, other: &EventVersion) -> bool {
        match self.created_at.cmp(&other.created_at) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.id < other.id,
        }
    }
}

/// An event that has not been bound to an author yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub kind: u16,
    pub created_at: u64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl EventTemplate {
    /// Bind the template to its author, ready for signing.
    pub fn into_unsigned(self, pubkey: PublicKey) -> UnsignedEvent {
        UnsignedEvent {
            pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
        }
    }
}

/// An event with an author but no signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub pubkey: PublicKey,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl UnsignedEvent {
    /// The event ID: SHA-256 over `[0, pubkey, created_at, kind, tags, content]`.
    pub fn id(&self) -> String {
        let commitment = serde_json::json!([
            0,
            self.pubkey.as_str(),
            self.created_at,
            self.kind,
            self.tags,
            self.content
        ]);
        hex::encode(Sha256::digest(commitment.to_string().as_bytes()))
    }

    /// Attach a signature produced by the signer.
    pub fn into_signed(self, sig: String) -> Event {
        Event {
            id: self.id(),
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        }
    }
}

/// Build the template of a settings event carrying `settings`.
pub fn build_settings_event(settings: &AppSettings, clock: &dyn Clock) -> Result<EventTemplate> {
    Ok(EventTemplate {
        kind: APP_SETTINGS_KIND,
        created_at: clock.now_secs(),
        tags: vec![vec![
            IDENTIFIER_TAG.to_string(),
            SETTINGS_IDENTIFIER.to_string(),
        ]],
        content: encode_settings(settings)?,
    })
}

/// Decode the settings carried by a settings event.
///
/// # Errors
/// [`SettingsError::NotSettingsEvent`] if the kind or identifier do not
/// match, otherwise whatever [`parse_settings`] reports for the content.
pub fn settings_from_event(event: &Event) -> std::result::Result<AppSettings, SettingsError> {
    if event.kind != APP_SETTINGS_KIND {
        return Err(SettingsError::NotSettingsEvent {
            event_id: event.id.clone(),
            reason: format!("kind {} is not {APP_SETTINGS_KIND}", event.kind),
        });
    }
    if event.identifier() != Some(SETTINGS_IDENTIFIER) {
        return Err(SettingsError::NotSettingsEvent {
            event_id: event.id.clone(),
            reason: format!("identifier {:?} does not match", event.identifier()),
        });
    }
    parse_settings(&event.content)
}
