//! The snapshot tree - registry of attached engines.
//!
//! ```text
//! SnapshotTree
//!   └─ RootSnapshot        one per attached engine
//!        └─ GroupSnapshot  one per storage partition
//!             └─ EntitySnapshot
//!                  └─ StructCapture
//! ```
//!
//! # Refresh
//!
//! [`SnapshotTree::refresh`] captures every root first and only installs
//! the results once all captures succeeded. A host failure leaves the whole
//! tree as it was and skips observers. On success every observer runs once,
//! after all roots are rebuilt.
//!
//! # Unknown engines
//!
//! `detach` and `refresh_root` on an id that is not attached always return
//! [`SnapshotError::UnknownEngine`]; they are never silent no-ops.

use std::{sync::Arc, time::Instant};

use tracing::{debug, warn};

use crate::{
    EngineHandle, EngineId, GroupSnapshot, Inspect, ObserverId, ObserverSet, RefreshSchedule,
    RootCapture, RootSnapshot, SnapshotError, SnapshotResult,
};

/// Top-level registry of attached engines and their latest snapshots.
#[derive(Debug, Default)]
pub struct SnapshotTree {
    /// Roots in attach order.
    roots: Vec<RootSnapshot>,
    observers: ObserverSet,
    next_engine: u32,
}

impl SnapshotTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a host and take its first snapshot.
    ///
    /// The tree keeps only a weak reference; the host must stay alive while
    /// attached. If the first snapshot fails nothing is registered.
    /// Observers are not notified.
    pub fn attach<H: Inspect + 'static>(
        &mut self,
        host: &Arc<H>,
        name: Option<&str>,
    ) -> SnapshotResult<&RootSnapshot> {
        if let Some(existing) = self.roots.iter().find(|r| r.engine().is(host)) {
            return Err(SnapshotError::DuplicateEngine(existing.id()));
        }

        let id = EngineId::new(self.next_engine);
        let mut root = RootSnapshot::new(EngineHandle::new(id, host, name.map(str::to_owned)));
        root.refresh()?;
        self.next_engine += 1;

        debug!(engine = %id, name = ?name, groups = root.groups().len(), "engine attached");
        let idx = self.roots.len();
        self.roots.push(root);
        Ok(&self.roots[idx])
    }

    /// Detach an engine, returning its last snapshot.
    pub fn detach(&mut self, id: EngineId) -> SnapshotResult<RootSnapshot> {
        let idx = self.index_of(id)?;
        debug!(engine = %id, "engine detached");
        Ok(self.roots.remove(idx))
    }

    /// Detach every engine. Observers are not notified and stay subscribed.
    pub fn clear(&mut self) {
        debug!(roots = self.roots.len(), "tree cleared");
        self.roots.clear();
    }

    /// Re-snapshot every root in attach order, then notify observers once.
    pub fn refresh(&mut self) -> SnapshotResult<()> {
        let captures = self
            .roots
            .iter()
            .map(RootSnapshot::capture)
            .collect::<SnapshotResult<Vec<RootCapture>>>()
            .inspect_err(|e| warn!(error = %e, "refresh failed, keeping previous tree"))?;

        for (root, capture) in self.roots.iter_mut().zip(captures) {
            root.commit(capture);
        }
        self.notify();
        Ok(())
    }

    /// Re-snapshot a single root, then notify observers once.
    pub fn refresh_root(&mut self, id: EngineId) -> SnapshotResult<()> {
        let idx = self.index_of(id)?;
        self.roots[idx]
            .refresh()
            .inspect_err(|e| warn!(engine = %id, error = %e, "root refresh failed"))?;
        self.notify();
        Ok(())
    }

    /// Refresh if the schedule says a pass is due. Returns whether it ran.
    ///
    /// A failed pass still counts as the scheduled one.
    pub fn poll(&mut self, schedule: &mut RefreshSchedule, now: Instant) -> SnapshotResult<bool> {
        if !schedule.is_due(now) {
            return Ok(false);
        }
        schedule.mark(now);
        self.refresh()?;
        Ok(true)
    }

    fn notify(&self) {
        let observers = self.observers.clone();
        observers.notify(self);
    }

    fn index_of(&self, id: EngineId) -> SnapshotResult<usize> {
        self.roots
            .iter()
            .position(|r| r.id() == id)
            .ok_or(SnapshotError::UnknownEngine(id))
    }

    /// Register an observer. See [`ObserverSet::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Self) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Shared observer registry, for subscribing from inside a callback.
    #[must_use]
    pub fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    /// Attached roots in attach order.
    #[must_use]
    pub fn roots(&self) -> &[RootSnapshot] {
        &self.roots
    }

    #[must_use]
    pub fn root(&self, id: EngineId) -> Option<&RootSnapshot> {
        self.roots.iter().find(|r| r.id() == id)
    }

    /// Engine id a host is attached under.
    #[must_use]
    pub fn engine_of<H: Inspect + 'static>(&self, host: &Arc<H>) -> Option<EngineId> {
        self.roots
            .iter()
            .find(|r| r.engine().is(host))
            .map(RootSnapshot::id)
    }

    /// Resolve a group's parent link.
    #[must_use]
    pub fn parent(&self, group: &GroupSnapshot) -> Option<&RootSnapshot> {
        self.root(group.root())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentValue, EntityId, GroupId, MemoryHost};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn host_with_entity() -> Arc<MemoryHost> {
        let host = Arc::new(MemoryHost::new());
        host.spawn(
            GroupId::new(0),
            EntityId::new(1),
            [("Health".into(), ComponentValue::json(20.into()))],
        );
        host
    }

    #[test]
    fn test_attach_snapshots_immediately() {
        let host = host_with_entity();
        let mut tree = SnapshotTree::new();
        let root = tree.attach(&host, Some("server")).unwrap();

        assert_eq!(root.name(), Some("server"));
        assert_eq!(root.groups().len(), 1);
        assert_eq!(root.generation(), 1);
    }

    #[test]
    fn test_duplicate_attach_is_rejected() {
        let host = host_with_entity();
        let mut tree = SnapshotTree::new();
        let id = tree.attach(&host, None).unwrap().id();

        let err = tree.attach(&host, Some("again")).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateEngine(dup) if dup == id));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots()[0].name(), None);
    }

    #[test]
    fn test_detach_unknown_is_error() {
        let mut tree = SnapshotTree::new();
        assert!(matches!(
            tree.detach(EngineId::new(7)),
            Err(SnapshotError::UnknownEngine(_))
        ));
        assert!(matches!(
            tree.refresh_root(EngineId::new(7)),
            Err(SnapshotError::UnknownEngine(_))
        ));
    }

    #[test]
    fn test_engine_ids_are_not_reused() {
        let mut tree = SnapshotTree::new();
        let a = host_with_entity();
        let b = host_with_entity();
        let first = tree.attach(&a, None).unwrap().id();
        tree.detach(first).unwrap();
        let second = tree.attach(&b, None).unwrap().id();
        assert_ne!(first, second);
        assert_eq!(tree.engine_of(&b), Some(second));
        assert_eq!(tree.engine_of(&a), None);
    }

    #[test]
    fn test_clear_skips_observers() {
        let host = host_with_entity();
        let mut tree = SnapshotTree::new();
        tree.attach(&host, None).unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        tree.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // An empty tree still reports a completed refresh.
        tree.refresh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_poll_respects_schedule() {
        let host = host_with_entity();
        let mut tree = SnapshotTree::new();
        tree.attach(&host, None).unwrap();

        let start = Instant::now();
        let mut schedule = RefreshSchedule::new(Duration::from_millis(100));
        assert!(tree.poll(&mut schedule, start).unwrap());
        assert!(!tree.poll(&mut schedule, start + Duration::from_millis(50)).unwrap());
        assert!(tree.poll(&mut schedule, start + Duration::from_millis(100)).unwrap());
        assert_eq!(tree.roots()[0].generation(), 3);
    }

    #[test]
    fn test_parent_resolves_group_root() {
        let host = host_with_entity();
        let mut tree = SnapshotTree::new();
        let id = tree.attach(&host, None).unwrap().id();
        let group = &tree.roots()[0].groups()[0];
        assert_eq!(tree.parent(group).map(RootSnapshot::id), Some(id));
    }
}
