//! Reactive value containers.
//!
//! These are the primitives the settings subsystem is built from. A container
//! holds a current value that can be read synchronously, and notifies
//! subscribers whenever a new value is set.
//!
//! ## Types
//!
//! - [`PersistentSubject<T>`]: always holds a value. Can be *connected* to
//!   another container so that everything the source emits is forwarded.
//! - [`Subject<T>`]: may be empty until its first value arrives. Empty
//!   subjects do not replay anything to new subscribers.
//! - [`ReadonlySubject<T>`]: a read/subscribe-only view of a
//!   [`PersistentSubject<T>`], handed out to code that must not write.
//! - [`Subscription`]: RAII handle for a registered observer. Dropping it
//!   removes the observer.
//! - [`Connection`]: handle for an active forwarding link created by
//!   [`PersistentSubject::connect`].
//!
//! ## Delivery
//!
//! Subscribing replays the current value to the new observer before
//! `subscribe` returns. Setting a value notifies observers synchronously, in
//! the order they subscribed, and each container delivers one value at a time
//! even when written from several threads. An observer must not set a value on
//! the container that is currently notifying it.
//!
//! ```
//! use relaydeck::reactive::{PersistentSubject, Subject};
//!
//! let remote = Subject::empty();
//! let current = PersistentSubject::new(1);
//!
//! let _link = current.connect(&remote);
//! assert_eq!(current.get(), 1); // nothing to forward yet
//!
//! remote.set(2);
//! assert_eq!(current.get(), 2);
//!
//! current.disconnect_all();
//! remote.set(3);
//! assert_eq!(current.get(), 2);
//! ```

mod subject;
mod subscription;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use subject::{Observable, PersistentSubject, ReadonlySubject, Subject};
pub use subscription::{Connection, Subscription};

/// Lock a mutex, recovering the data if a panicking observer poisoned it.
///
/// Container state is always left consistent before observers run, so a
/// poisoned lock carries no torn state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
