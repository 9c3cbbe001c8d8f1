//! Per-engine snapshot roots.

use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::{EngineId, GroupId, GroupSnapshot, Inspect, SnapshotError, SnapshotResult};

/// Non-owning reference to an attached host engine plus its display name.
#[derive(Clone)]
pub struct EngineHandle {
    id: EngineId,
    name: Option<String>,
    host: Weak<dyn Inspect>,
}

impl EngineHandle {
    pub(crate) fn new<H: Inspect + 'static>(
        id: EngineId,
        host: &Arc<H>,
        name: Option<String>,
    ) -> Self {
        let weak: Weak<H> = Arc::downgrade(host);
        let host: Weak<dyn Inspect> = weak;
        Self { id, name, host }
    }

    #[must_use]
    pub const fn id(&self) -> EngineId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this handle refers to the given host allocation.
    #[must_use]
    pub fn is<H: Inspect + 'static>(&self, host: &Arc<H>) -> bool {
        let weak: Weak<H> = Arc::downgrade(host);
        let other: Weak<dyn Inspect> = weak;
        self.host.ptr_eq(&other)
    }

    /// Whether the host is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.host.strong_count() > 0
    }

    fn upgrade(&self) -> SnapshotResult<Arc<dyn Inspect>> {
        self.host
            .upgrade()
            .ok_or(SnapshotError::EngineDropped(self.id))
    }
}

impl core::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Everything captured from one host in a single pass.
///
/// Built off to the side by [`RootSnapshot::capture`] and installed with
/// [`RootSnapshot::commit`], so a failed pass never touches the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootCapture {
    groups: Vec<GroupSnapshot>,
    systems: Vec<String>,
}

impl RootCapture {
    #[must_use]
    pub fn groups(&self) -> &[GroupSnapshot] {
        &self.groups
    }
}

/// One attached engine and all groups captured from it.
#[derive(Debug, Clone)]
pub struct RootSnapshot {
    engine: EngineHandle,
    groups: Vec<GroupSnapshot>,
    systems: Vec<String>,
    /// Number of successful captures, the first one included.
    generation: u64,
}

impl RootSnapshot {
    /// Create a root that has not been captured yet.
    pub(crate) const fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            groups: Vec::new(),
            systems: Vec::new(),
            generation: 0,
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    #[must_use]
    pub const fn id(&self) -> EngineId {
        self.engine.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.engine.name()
    }

    /// Display name, falling back to the engine id.
    #[must_use]
    pub fn label(&self) -> String {
        self.engine
            .name()
            .map_or_else(|| self.engine.id.to_string(), str::to_owned)
    }

    /// Groups from the last successful capture, in host order.
    #[must_use]
    pub fn groups(&self) -> &[GroupSnapshot] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// Systems the host reported as registered.
    #[must_use]
    pub fn systems(&self) -> &[String] {
        &self.systems
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Capture the host's current state without modifying `self`.
    ///
    /// Any host failure aborts the whole capture.
    pub fn capture(&self) -> SnapshotResult<RootCapture> {
        let id = self.engine.id;
        let host = self.engine.upgrade()?;
        let inspection = |source| SnapshotError::Inspection { engine: id, source };

        let listed = host.groups().map_err(inspection)?;
        let mut groups: Vec<GroupSnapshot> = Vec::with_capacity(listed.len());
        for (group, store) in listed {
            if groups.iter().any(|g| g.id() == group) {
                warn!(engine = %id, %group, "host listed group twice, keeping first");
                continue;
            }
            groups.push(
                GroupSnapshot::capture(id, group, store, &*host).map_err(inspection)?,
            );
        }
        let systems = host.systems().map_err(inspection)?;

        Ok(RootCapture { groups, systems })
    }

    /// Install a capture, replacing every group wholesale.
    pub fn commit(&mut self, capture: RootCapture) {
        self.groups = capture.groups;
        self.systems = capture.systems;
        self.generation += 1;
        debug!(
            engine = %self.engine.id,
            generation = self.generation,
            groups = self.groups.len(),
            entities = self.groups.iter().map(|g| g.entities().len()).sum::<usize>(),
            "root refreshed"
        );
    }

    /// Capture and commit in one step. On error the root is unchanged.
    pub fn refresh(&mut self) -> SnapshotResult<()> {
        let capture = self.capture()?;
        self.commit(capture);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentValue, EntityId, LocalSlot, MemoryHost};

    fn root_for(host: &Arc<MemoryHost>) -> RootSnapshot {
        RootSnapshot::new(EngineHandle::new(EngineId::new(1), host, Some("main".into())))
    }

    #[test]
    fn test_refresh_replaces_groups() {
        let host = Arc::new(MemoryHost::new());
        host.spawn(GroupId::new(1), EntityId::new(1), [("A".into(), ComponentValue::json(1.into()))]);
        host.insert_group(GroupId::new(2));

        let mut root = root_for(&host);
        root.refresh().unwrap();
        assert_eq!(root.groups().len(), 2);
        assert_eq!(root.generation(), 1);
        assert_eq!(root.label(), "main");

        host.remove_group(GroupId::new(1));
        root.refresh().unwrap();
        let ids: Vec<_> = root.groups().iter().map(GroupSnapshot::id).collect();
        assert_eq!(ids, [GroupId::new(2)]);
        assert!(root.group(GroupId::new(2)).unwrap().entities().is_empty());
        assert_eq!(root.group(GroupId::new(2)).unwrap().root(), root.id());
    }

    #[test]
    fn test_handle_identity_follows_allocation() {
        let host = Arc::new(MemoryHost::new());
        let twin = Arc::new(MemoryHost::new());
        let handle = EngineHandle::new(EngineId::new(1), &host, None);

        assert!(handle.is(&host));
        assert!(handle.is(&Arc::clone(&host)));
        assert!(!handle.is(&twin));
        assert!(handle.is_alive());
    }

    #[test]
    fn test_zero_groups_is_not_an_error() {
        let host = Arc::new(MemoryHost::new());
        let mut root = root_for(&host);
        root.refresh().unwrap();
        assert!(root.groups().is_empty());
    }

    #[test]
    fn test_systems_are_captured() {
        let host = Arc::new(MemoryHost::new());
        host.add_system("movement");
        host.add_system("physics");
        let mut root = root_for(&host);
        root.refresh().unwrap();
        assert_eq!(root.systems(), ["movement", "physics"]);
    }

    #[test]
    fn test_dropped_host_reports_error() {
        let host = Arc::new(MemoryHost::new());
        host.set_component(GroupId::new(0), LocalSlot::new(0), "A", ComponentValue::opaque(None));
        let mut root = root_for(&host);
        root.refresh().unwrap();
        drop(host);

        assert!(!root.engine().is_alive());
        assert!(matches!(root.refresh(), Err(SnapshotError::EngineDropped(_))));
        assert_eq!(root.groups().len(), 1);
        assert_eq!(root.generation(), 1);
    }
}
