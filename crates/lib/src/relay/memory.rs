//! In-process relay pool.
//!
//! Holds events per relay and serves subscriptions from memory. Used by the
//! test suite and by the CLI, which fills it from a JSON fixture file.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use super::{EventSource, Filter, RelaySet, RelayUrl};
use crate::{Result, constants::SUBSCRIPTION_BUFFER, event::Event};

struct LiveSubscription {
    relays: RelaySet,
    filter: Filter,
    tx: mpsc::Sender<Event>,
}

#[derive(Default)]
struct PoolState {
    events: HashMap<RelayUrl, Vec<Event>>,
    live: Vec<LiveSubscription>,
    requests: Vec<(RelaySet, Filter)>,
}

/// Addressable events are replaced per (kind, author, identifier).
fn is_addressable(event: &Event) -> bool {
    (30000..40000).contains(&event.kind)
}

fn same_address(a: &Event, b: &Event) -> bool {
    a.kind == b.kind && a.pubkey == b.pubkey && a.identifier() == b.identifier()
}

/// A set of relays kept in memory.
#[derive(Default)]
pub struct MemoryRelayPool {
    state: Mutex<PoolState>,
}

impl MemoryRelayPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from a JSON file mapping relay URLs to event lists.
    ///
    /// ```json
    /// { "wss://relay.example": [ { "id": "…", "pubkey": "…", … } ] }
    /// ```
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let fixture: HashMap<RelayUrl, Vec<Event>> = serde_json::from_str(&json)?;

        let pool = Self::new();
        let mut count = 0;
        for (relay, events) in fixture {
            for event in events {
                if pool.publish(&relay, event).await {
                    count += 1;
                }
            }
        }
        tracing::info!(events = count, "Loaded relay fixture from {}", path.display());
        Ok(pool)
    }

    /// Store `event` on `relay` and deliver it to live subscriptions.
    ///
    /// Returns `false` if the relay already holds this event or a newer
    /// version of the same addressable event.
    pub async fn publish(&self, relay: &RelayUrl, event: Event) -> bool {
        let mut state = self.state.lock().await;

        let stored = state.events.entry(relay.clone()).or_default();
        if stored.iter().any(|e| e.id == event.id) {
            return false;
        }
        if is_addressable(&event) {
            if let Some(pos) = stored.iter().position(|e| same_address(e, &event)) {
                if !event.version().supersedes(&stored[pos].version()) {
                    tracing::trace!(relay = %relay, id = %event.id, "Ignoring older replaceable event");
                    return false;
                }
                stored.remove(pos);
            }
        }
        stored.push(event.clone());

        state.live.retain(|live| {
            if !live.relays.contains(relay) || !live.filter.matches(&event) {
                return !live.tx.is_closed();
            }
            match live.tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(relay = %relay, "Subscriber is full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
        true
    }

    /// Events currently held by `relay`.
    pub async fn events(&self, relay: &RelayUrl) -> Vec<Event> {
        self.state
            .lock()
            .await
            .events
            .get(relay)
            .cloned()
            .unwrap_or_default()
    }

    /// Every relay holding at least one event.
    pub async fn relays(&self) -> RelaySet {
        let state = self.state.lock().await;
        let mut relays: Vec<RelayUrl> = state
            .events
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .map(|(relay, _)| relay.clone())
            .collect();
        relays.sort();
        relays.into()
    }

    /// Number of subscriptions opened so far.
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Every subscription opened so far, oldest first.
    pub async fn requests(&self) -> Vec<(RelaySet, Filter)> {
        self.state.lock().await.requests.clone()
    }
}

#[async_trait]
impl EventSource for MemoryRelayPool {
    async fn subscribe(&self, relays: &RelaySet, filter: &Filter) -> Result<mpsc::Receiver<Event>> {
        let mut state = self.state.lock().await;
        state.requests.push((relays.clone(), filter.clone()));

        let mut seen = HashSet::new();
        let initial: Vec<Event> = relays
            .iter()
            .filter_map(|relay| state.events.get(relay))
            .flatten()
            .filter(|event| filter.matches(event) && seen.insert(event.id.clone()))
            .cloned()
            .collect();

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER.max(initial.len()));
        for event in initial {
            // Capacity covers every stored event
            let _ = tx.try_send(event);
        }
        state.live.push(LiveSubscription {
            relays: relays.clone(),
            filter: filter.clone(),
            tx,
        });
        Ok(rx)
    }
}

impl std::fmt::Debug for MemoryRelayPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRelayPool").finish_non_exhaustive()
    }
}
