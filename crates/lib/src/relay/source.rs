//! The seam between the settings subsystem and the relay transport.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::RelaySet;
use crate::{
    Result,
    constants::{APP_SETTINGS_KIND, SETTINGS_IDENTIFIER},
    event::Event,
    keys::PublicKey,
};

/// Selects the events a subscription is interested in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    pub kind: u16,
    pub author: PublicKey,
    /// Required `d` tag value, for addressable events
    pub identifier: Option<String>,
}

impl Filter {
    /// The filter for an account's settings event.
    pub fn settings(author: PublicKey) -> Self {
        Self {
            kind: APP_SETTINGS_KIND,
            author,
            identifier: Some(SETTINGS_IDENTIFIER.to_string()),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        event.kind == self.kind
            && event.pubkey == self.author
            && match &self.identifier {
                Some(identifier) => event.identifier() == Some(identifier.as_str()),
                None => true,
            }
    }
}

/// A source of events from a set of relays.
///
/// Implementations deliver stored events matching the filter and keep
/// delivering new ones for as long as the receiver is held. Dropping the
/// receiver closes the subscription. Events are expected to be verified
/// already.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a subscription for `filter` on every relay in `relays`.
    async fn subscribe(&self, relays: &RelaySet, filter: &Filter) -> Result<mpsc::Receiver<Event>>;
}
