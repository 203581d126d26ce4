//! Observer and forwarding handles.

use std::sync::{Arc, Mutex, Weak};

use super::lock;

/// Identifier of a registered observer within one container.
pub(crate) type ObserverId = u64;

/// Something an observer can be removed from.
///
/// Lets a [`Subscription`] stay untyped while the container it points at is
/// generic over its value type.
pub(crate) trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: ObserverId);
}

/// Handle for a registered observer.
///
/// The observer stays registered for as long as this handle is alive.
/// Dropping the handle after the container itself is gone does nothing.
#[must_use = "dropping a Subscription immediately removes its observer"]
pub struct Subscription {
    source: Weak<dyn Unsubscribe>,
    id: ObserverId,
}

impl Subscription {
    pub(crate) fn new(source: Weak<dyn Unsubscribe>, id: ObserverId) -> Self {
        Self { source, id }
    }

    /// Remove the observer now.
    pub fn unsubscribe(self) {
        // Drop does the work
    }

    /// Whether the container this subscription belongs to still exists.
    pub fn is_source_alive(&self) -> bool {
        self.source.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("source_alive", &self.is_source_alive())
            .finish()
    }
}

struct ConnectionInner {
    /// Held for the whole duration of a forward.
    active: Mutex<bool>,
    upstream: Mutex<Option<Subscription>>,
}

/// Handle for a forwarding link between a source and a target container.
///
/// Clones refer to the same link. The target keeps one clone so that
/// [`PersistentSubject::disconnect_all`](super::PersistentSubject::disconnect_all)
/// can tear it down; dropping the returned handle does not disconnect.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                active: Mutex::new(true),
                upstream: Mutex::new(None),
            }),
        }
    }

    /// Attach the subscription on the source. If the link was disconnected
    /// while it was being established, the subscription is dropped at once.
    pub(crate) fn attach(&self, upstream: Subscription) {
        let active = lock(&self.inner.active);
        if *active {
            *lock(&self.inner.upstream) = Some(upstream);
        }
    }

    /// Run `forward` if the link is still active.
    ///
    /// The link's lock is held while `forward` runs, so [`disconnect`](Self::disconnect)
    /// cannot return while a value is halfway through being forwarded.
    pub(crate) fn forward(&self, forward: impl FnOnce()) {
        let active = lock(&self.inner.active);
        if *active {
            forward();
        }
    }

    /// Stop forwarding and unsubscribe from the source.
    ///
    /// Once this returns, no value from the source reaches the target through
    /// this link. Disconnecting twice is a no-op.
    pub fn disconnect(&self) {
        {
            let mut active = lock(&self.inner.active);
            *active = false;
        }
        let upstream = lock(&self.inner.upstream).take();
        drop(upstream);
    }

    /// Whether values are still being forwarded.
    pub fn is_connected(&self) -> bool {
        *lock(&self.inner.active)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}
