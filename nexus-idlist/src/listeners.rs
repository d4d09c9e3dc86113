//! Thread-safe listener registry.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::set::LinkedSet;

/// Registry of shared listeners, deduplicated by identity.
///
/// Listeners are called in registration order. [`fire`](Self::fire) calls
/// them on a snapshot taken under the lock, so a listener may add or remove
/// listeners (including itself) while being called.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use nexus_idlist::Listeners;
///
/// let total = Arc::new(AtomicU64::new(0));
/// let listeners: Listeners<dyn Fn(u64) + Send + Sync> = Listeners::new();
///
/// let sink = Arc::clone(&total);
/// let listener: Arc<dyn Fn(u64) + Send + Sync> = Arc::new(move |n| {
///     sink.fetch_add(n, Ordering::Relaxed);
/// });
/// assert!(listeners.add_listener(Arc::clone(&listener)));
/// assert!(!listeners.add_listener(Arc::clone(&listener)));
///
/// listeners.fire(|l| l(5));
/// assert_eq!(total.load(Ordering::Relaxed), 5);
/// ```
pub struct Listeners<L: ?Sized> {
    set: Mutex<LinkedSet<L>>,
}

impl<L: ?Sized> Listeners<L> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            set: Mutex::new(LinkedSet::by_identity()),
        }
    }

    /// Registers `listener` unless it is already registered.
    pub fn add_listener(&self, listener: Arc<L>) -> bool {
        self.set.lock().add(listener)
    }

    /// Registers every listener not already registered. Returns `true` if
    /// any was added.
    pub fn add_all<I>(&self, listeners: I) -> bool
    where
        I: IntoIterator<Item = Arc<L>>,
    {
        self.set.lock().add_all(listeners)
    }

    /// Unregisters `listener`. Returns `true` if it was registered.
    pub fn remove_listener(&self, listener: &Arc<L>) -> bool {
        self.set.lock().remove(listener).is_some()
    }

    /// Snapshot of the registered listeners in registration order.
    pub fn listeners(&self) -> Vec<Arc<L>> {
        self.set.lock().iter().cloned().collect()
    }

    /// Calls `f` once per listener, without holding the registry lock.
    pub fn fire<F>(&self, mut f: F)
    where
        F: FnMut(&L),
    {
        let snapshot = self.listeners();
        trace!(listeners = snapshot.len(), "firing");
        for listener in &snapshot {
            f(&**listener);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.set.lock().len()
    }

    /// Returns `true` if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.set.lock().is_empty()
    }
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}
