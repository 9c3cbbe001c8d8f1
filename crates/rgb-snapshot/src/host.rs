//! In-memory grouped column store implementing [`Inspect`].
//!
//! Mirrors how an archetype world lays data out: each group owns one sparse
//! column per component kind, keyed by slot, plus a locator table mapping
//! entities to slots. Mutation goes through `&self` so the host can keep
//! changing while it is attached to a snapshot tree.

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::{
    ColumnHandle, ComponentTypeKey, ComponentValue, EntityId, GroupId, Inspect, InspectError,
    LocalSlot, StoreHandle,
};

/// One component column: slot → value.
struct ColumnStorage {
    key: ComponentTypeKey,
    handle: ColumnHandle,
    values: HashMap<LocalSlot, ComponentValue>,
}

/// Storage for one group.
struct GroupStorage {
    store: StoreHandle,
    columns: Vec<ColumnStorage>,
    /// `None` until the first entity is located in this group.
    locators: Option<Vec<(EntityId, LocalSlot)>>,
    /// One past the highest slot ever written or located. Never decreases.
    next_slot: u32,
}

impl GroupStorage {
    fn column_mut(&mut self, key: &ComponentTypeKey) -> Option<&mut ColumnStorage> {
        self.columns.iter_mut().find(|c| &c.key == key)
    }

    fn claim(&mut self, slot: LocalSlot) {
        self.next_slot = self.next_slot.max(slot.raw().saturating_add(1));
    }
}

#[derive(Default)]
struct HostState {
    /// Groups in creation order.
    groups: Vec<(GroupId, GroupStorage)>,
    stores: HashMap<StoreHandle, GroupId>,
    columns: HashMap<ColumnHandle, (GroupId, usize)>,
    next_handle: u64,
    systems: Vec<String>,
}

impl HostState {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn group(&self, id: GroupId) -> Option<&GroupStorage> {
        self.groups.iter().find(|(g, _)| *g == id).map(|(_, s)| s)
    }

    fn group_mut(&mut self, id: GroupId) -> Option<&mut GroupStorage> {
        self.groups
            .iter_mut()
            .find(|(g, _)| *g == id)
            .map(|(_, s)| s)
    }

    fn group_index_or_insert(&mut self, id: GroupId) -> usize {
        if let Some(pos) = self.groups.iter().position(|(g, _)| *g == id) {
            return pos;
        }
        let store = StoreHandle::new(self.next_handle());
        self.stores.insert(store, id);
        self.groups.push((
            id,
            GroupStorage {
                store,
                columns: Vec::new(),
                locators: None,
                next_slot: 0,
            },
        ));
        self.groups.len() - 1
    }

    fn group_or_insert(&mut self, id: GroupId) -> &mut GroupStorage {
        let pos = self.group_index_or_insert(id);
        &mut self.groups[pos].1
    }

    fn column_or_insert(&mut self, id: GroupId, key: ComponentTypeKey) -> &mut ColumnStorage {
        let pos = self.group_index_or_insert(id);
        let existing = self.groups[pos].1.columns.iter().position(|c| c.key == key);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let handle = ColumnHandle::new(self.next_handle());
                let columns = &mut self.groups[pos].1.columns;
                columns.push(ColumnStorage {
                    key,
                    handle,
                    values: HashMap::new(),
                });
                let idx = columns.len() - 1;
                self.columns.insert(handle, (id, idx));
                idx
            }
        };
        &mut self.groups[pos].1.columns[idx]
    }

    fn column(&self, handle: ColumnHandle) -> Option<&ColumnStorage> {
        let &(group, idx) = self.columns.get(&handle)?;
        self.group(group)?.columns.get(idx)
    }
}

/// Reference host backed by plain maps.
#[derive(Default)]
pub struct MemoryHost {
    state: RwLock<HostState>,
}

impl MemoryHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system name reported through [`Inspect::systems`].
    pub fn add_system(&self, name: impl Into<String>) {
        self.state.write().systems.push(name.into());
    }

    /// Create an empty group (no columns, no locator data) if absent.
    pub fn insert_group(&self, group: GroupId) {
        self.state.write().group_or_insert(group);
    }

    /// Remove a group with all its columns and locators.
    pub fn remove_group(&self, group: GroupId) -> bool {
        let mut state = self.state.write();
        let Some(pos) = state.groups.iter().position(|(g, _)| *g == group) else {
            return false;
        };
        let (_, storage) = state.groups.remove(pos);
        state.stores.remove(&storage.store);
        for column in &storage.columns {
            state.columns.remove(&column.handle);
        }
        true
    }

    /// Store a component value at a slot, creating group and column as needed.
    pub fn set_component(
        &self,
        group: GroupId,
        slot: LocalSlot,
        key: impl Into<ComponentTypeKey>,
        value: ComponentValue,
    ) {
        let mut state = self.state.write();
        state.group_or_insert(group).claim(slot);
        state.column_or_insert(group, key.into()).values.insert(slot, value);
    }

    /// Mutate a stored component in place. Returns `false` if absent.
    pub fn update_component(
        &self,
        group: GroupId,
        slot: LocalSlot,
        key: &ComponentTypeKey,
        f: impl FnOnce(&mut ComponentValue),
    ) -> bool {
        let mut state = self.state.write();
        let Some(value) = state
            .group_mut(group)
            .and_then(|g| g.column_mut(key))
            .and_then(|c| c.values.get_mut(&slot))
        else {
            return false;
        };
        f(value);
        true
    }

    /// Remove a component value from a slot.
    pub fn remove_component(
        &self,
        group: GroupId,
        slot: LocalSlot,
        key: &ComponentTypeKey,
    ) -> Option<ComponentValue> {
        self.state
            .write()
            .group_mut(group)?
            .column_mut(key)?
            .values
            .remove(&slot)
    }

    /// Point an entity at a slot. Re-locating an entity moves it in place.
    pub fn locate(&self, group: GroupId, entity: EntityId, slot: LocalSlot) {
        let mut state = self.state.write();
        let storage = state.group_or_insert(group);
        storage.claim(slot);
        let locators = storage.locators.get_or_insert_with(Vec::new);
        match locators.iter_mut().find(|(e, _)| *e == entity) {
            Some(entry) => entry.1 = slot,
            None => locators.push((entity, slot)),
        }
    }

    /// Drop an entity's locator entry. Its column values stay behind.
    pub fn unlocate(&self, group: GroupId, entity: EntityId) -> bool {
        let mut state = self.state.write();
        let Some(locators) = state.group_mut(group).and_then(|g| g.locators.as_mut()) else {
            return false;
        };
        let before = locators.len();
        locators.retain(|(e, _)| *e != entity);
        locators.len() != before
    }

    /// Forget all locator data of a group, keeping its columns.
    pub fn clear_locators(&self, group: GroupId) {
        if let Some(g) = self.state.write().group_mut(group) {
            g.locators = None;
        }
    }

    /// Add an entity at a fresh slot with the given components.
    ///
    /// Slots are never handed out twice, so values left behind by
    /// [`unlocate`](Self::unlocate) are not overwritten.
    pub fn spawn(
        &self,
        group: GroupId,
        entity: EntityId,
        components: impl IntoIterator<Item = (ComponentTypeKey, ComponentValue)>,
    ) -> LocalSlot {
        let slot = {
            let mut state = self.state.write();
            LocalSlot::new(state.group_or_insert(group).next_slot)
        };
        self.locate(group, entity, slot);
        for (key, value) in components {
            self.set_component(group, slot, key, value);
        }
        slot
    }

    /// Total number of stored component values across all groups.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.state
            .read()
            .groups
            .iter()
            .flat_map(|(_, g)| &g.columns)
            .map(|c| c.values.len())
            .sum()
    }
}

impl Inspect for MemoryHost {
    fn groups(&self) -> Result<Vec<(GroupId, StoreHandle)>, InspectError> {
        Ok(self
            .state
            .read()
            .groups
            .iter()
            .map(|(id, g)| (*id, g.store))
            .collect())
    }

    fn locators(&self, group: GroupId) -> Result<Option<Vec<(EntityId, LocalSlot)>>, InspectError> {
        let state = self.state.read();
        let storage = state.group(group).ok_or(InspectError::GroupVanished(group))?;
        Ok(storage.locators.clone())
    }

    fn columns(
        &self,
        store: StoreHandle,
    ) -> Result<Vec<(ComponentTypeKey, ColumnHandle)>, InspectError> {
        let state = self.state.read();
        let storage = state
            .stores
            .get(&store)
            .and_then(|&g| state.group(g))
            .ok_or(InspectError::StoreVanished(store))?;
        Ok(storage
            .columns
            .iter()
            .map(|c| (c.key.clone(), c.handle))
            .collect())
    }

    fn probe(
        &self,
        column: ColumnHandle,
        slot: LocalSlot,
    ) -> Result<Option<ComponentValue>, InspectError> {
        let state = self.state.read();
        let storage = state
            .column(column)
            .ok_or(InspectError::ColumnVanished(column))?;
        Ok(storage.values.get(&slot).cloned())
    }

    fn systems(&self) -> Result<Vec<String>, InspectError> {
        Ok(self.state.read().systems.clone())
    }
}
