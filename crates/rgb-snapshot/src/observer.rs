//! Observers notified after each completed refresh.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::SnapshotTree;

/// Unique identifier for a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

impl ObserverId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Type-erased observer callback.
pub(crate) type ObserverFn = dyn Fn(&SnapshotTree) + Send + Sync;

struct ObserverEntry {
    id: ObserverId,
    callback: Arc<ObserverFn>,
}

#[derive(Default)]
struct ObserverSetInner {
    /// Observers in subscription order.
    observers: Vec<ObserverEntry>,
    next_id: u32,
}

/// Observer registry handle - cloneable wrapper around shared state.
///
/// Clones share the same registry, so an observer can hold a clone and
/// subscribe or unsubscribe from inside its own callback. The lock is
/// never held while a callback runs.
#[derive(Clone, Default)]
pub struct ObserverSet {
    inner: Arc<RwLock<ObserverSetInner>>,
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, invoked once after every successful refresh.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&SnapshotTree) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = ObserverId(inner.next_id);
        inner.next_id += 1;
        inner.observers.push(ObserverEntry {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.observers.len();
        inner.observers.retain(|o| o.id != id);
        inner.observers.len() != before
    }

    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.inner.read().observers.iter().any(|o| o.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().observers.is_empty()
    }

    /// Drop every callback.
    pub fn clear(&self) {
        self.inner.write().observers.clear();
    }

    /// Invoke each observer registered at the start of the pass, in order.
    ///
    /// Observers added during the pass wait for the next one; observers
    /// removed before their turn are skipped.
    pub(crate) fn notify(&self, tree: &SnapshotTree) {
        let pending: Vec<(ObserverId, Arc<ObserverFn>)> = self
            .inner
            .read()
            .observers
            .iter()
            .map(|o| (o.id, Arc::clone(&o.callback)))
            .collect();

        for (id, callback) in pending {
            if self.contains(id) {
                callback(tree);
            }
        }
    }
}

impl core::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
