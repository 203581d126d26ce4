//! Subject types: observable holders of a current value.

use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicU64, Ordering},
};

use super::{
    lock,
    subscription::{Connection, ObserverId, Subscription, Unsubscribe},
};

type Observer<V> = Arc<dyn Fn(&V) + Send + Sync>;

struct State<V> {
    value: V,
    observers: Vec<(ObserverId, Observer<V>)>,
    connections: Vec<Connection>,
}

/// Storage shared by every handle onto one container.
///
/// `delivery` is held while a value is stored and handed to observers, and
/// while a new observer receives its replay. `state` is only held for short
/// reads and writes and never while an observer runs.
struct Shared<V> {
    state: Mutex<State<V>>,
    delivery: Mutex<()>,
    next_id: AtomicU64,
}

impl<V: Clone + Send + 'static> Shared<V> {
    fn new(value: V) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                value,
                observers: Vec::new(),
                connections: Vec::new(),
            }),
            delivery: Mutex::new(()),
            next_id: AtomicU64::new(0),
        })
    }

    fn get(&self) -> V {
        lock(&self.state).value.clone()
    }

    fn peek<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&lock(&self.state).value)
    }

    fn set(&self, value: V) {
        let _delivery = lock(&self.delivery);
        let observers: Vec<Observer<V>> = {
            let mut state = lock(&self.state);
            state.value = value.clone();
            state.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };
        for observer in observers {
            observer(&value);
        }
    }

    fn subscribe(self: &Arc<Self>, observer: Observer<V>) -> Subscription {
        let _delivery = lock(&self.delivery);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let current = {
            let mut state = lock(&self.state);
            state.observers.push((id, Arc::clone(&observer)));
            state.value.clone()
        };
        observer(&current);

        let source: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription::new(source, id)
    }

    fn observer_count(&self) -> usize {
        lock(&self.state).observers.len()
    }
}

impl<V: Send + 'static> Unsubscribe for Shared<V> {
    fn unsubscribe(&self, id: ObserverId) {
        lock(&self.state).observers.retain(|(observer_id, _)| *observer_id != id);
    }
}

/// Anything that can be subscribed to for values of type `T`.
///
/// Implemented by every subject type so that [`PersistentSubject::connect`]
/// accepts any of them as a source.
pub trait Observable<T> {
    /// Register `observer` and replay the current value to it, if there is one.
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static;
}

/// A container that always holds a value.
///
/// Cloning produces another handle onto the same container.
pub struct PersistentSubject<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for PersistentSubject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> PersistentSubject<T> {
    /// Create a container holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            shared: Shared::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.shared.get()
    }

    /// Inspect the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.shared.peek(f)
    }

    /// Store `value` and notify every observer, in subscription order.
    pub fn set(&self, value: T) {
        self.shared.set(value);
    }

    /// Register `observer` for every future value. It is called once with the
    /// current value before this returns.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(observer))
    }

    /// Forward every value `source` emits into this container, starting with
    /// the value it holds right now.
    ///
    /// Callers that want a single upstream must call
    /// [`disconnect_all`](Self::disconnect_all) first; this method does not
    /// replace existing links.
    pub fn connect<S>(&self, source: &S) -> Connection
    where
        S: Observable<T>,
    {
        let connection = Connection::new();
        let target = Arc::downgrade(&self.shared);
        let link = connection.clone();

        let upstream = source.subscribe(move |value: &T| {
            link.forward(|| {
                if let Some(target) = target.upgrade() {
                    target.set(value.clone());
                }
            });
        });
        connection.attach(upstream);

        lock(&self.shared.state).connections.push(connection.clone());
        connection
    }

    /// Tear down every link created by [`connect`](Self::connect).
    ///
    /// The sources are left untouched and later calls to [`set`](Self::set)
    /// behave as usual.
    pub fn disconnect_all(&self) {
        let connections = std::mem::take(&mut lock(&self.shared.state).connections);
        for connection in connections {
            connection.disconnect();
        }
    }

    /// Number of links that are still forwarding.
    pub fn connection_count(&self) -> usize {
        // Clone out first; checking a link takes its lock, which a forward
        // holds while it writes into this container.
        let connections = lock(&self.shared.state).connections.clone();
        connections.iter().filter(|c| c.is_connected()).count()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.observer_count()
    }

    /// A view of this container that can be read and subscribed to only.
    pub fn readonly(&self) -> ReadonlySubject<T> {
        ReadonlySubject {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for PersistentSubject<T> {
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        PersistentSubject::subscribe(self, observer)
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for PersistentSubject<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for PersistentSubject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentSubject")
            .field("value", &self.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Read and subscribe access to a [`PersistentSubject`].
pub struct ReadonlySubject<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ReadonlySubject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ReadonlySubject<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.shared.get()
    }

    /// Inspect the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.shared.peek(f)
    }

    /// See [`PersistentSubject::subscribe`].
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(observer))
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for ReadonlySubject<T> {
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        ReadonlySubject::subscribe(self, observer)
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for ReadonlySubject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadonlySubject")
            .field("value", &self.get())
            .finish()
    }
}

/// A container that starts empty and holds a value once one is set.
///
/// Observers are only ever called with real values: subscribing to an empty
/// subject registers the observer without a replay.
pub struct Subject<T> {
    shared: Arc<Shared<Option<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    /// Create an empty subject.
    pub fn empty() -> Self {
        Self {
            shared: Shared::new(None),
        }
    }

    /// Create a subject that already holds `value`.
    pub fn new(value: T) -> Self {
        Self {
            shared: Shared::new(Some(value)),
        }
    }

    /// Get a clone of the current value, if any.
    pub fn get(&self) -> Option<T> {
        self.shared.get()
    }

    /// Whether a value has ever been set.
    pub fn has_value(&self) -> bool {
        self.shared.peek(Option::is_some)
    }

    /// Store `value` and notify every observer, in subscription order.
    pub fn set(&self, value: T) {
        self.shared.set(Some(value));
    }

    /// Register `observer` for every future value. If the subject holds a
    /// value, the observer is called with it before this returns.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(move |value: &Option<T>| {
            if let Some(value) = value {
                observer(value);
            }
        }))
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.observer_count()
    }

    /// Whether two handles refer to the same subject.
    pub fn ptr_eq(&self, other: &Subject<T>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for Subject<T> {
    fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Subject::subscribe(self, observer)
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("value", &self.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}
