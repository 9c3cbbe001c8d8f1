//! Group reconciliation.
//!
//! A host keeps two independently keyed tables per group:
//!
//! ```text
//! column store:  ComponentTypeKey → (LocalSlot → value)
//! locator map:   EntityId         → LocalSlot
//! ```
//!
//! [`GroupSnapshot::capture`] joins them into an entity-centric view. The
//! outer loop runs over columns and the inner loop over locator entries,
//! which fixes both the order entities are discovered in and the order of
//! components within each entity.

use hashbrown::HashMap;
use tracing::trace;

use crate::{
    ComponentTypeKey, EngineId, EntityId, EntitySnapshot, GroupId, Inspect, InspectError,
    StoreHandle, StructCapture,
};

/// One storage partition and the entities captured within it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    id: GroupId,
    /// Parent root. Points at a snapshot node, never into host storage.
    root: EngineId,
    entities: Vec<EntitySnapshot>,
    /// EntityId → index into `entities`.
    index: HashMap<EntityId, usize>,
    has_locators: bool,
}

impl GroupSnapshot {
    /// Create a group with no entities.
    #[must_use]
    pub fn empty(root: EngineId, id: GroupId) -> Self {
        Self {
            id,
            root,
            entities: Vec::new(),
            index: HashMap::new(),
            has_locators: false,
        }
    }

    /// Capture one group from the host.
    ///
    /// A group without locator data yields no entities. A slot with no
    /// value in a column means the entity lacks that component and is
    /// skipped.
    pub fn capture(
        root: EngineId,
        id: GroupId,
        store: StoreHandle,
        host: &dyn Inspect,
    ) -> Result<Self, InspectError> {
        let mut group = Self::empty(root, id);

        let Some(locators) = host.locators(id)? else {
            trace!(group = %id, "no locator data, capturing empty group");
            return Ok(group);
        };
        group.has_locators = true;

        for (component, column) in host.columns(store)? {
            for &(entity, slot) in &locators {
                if let Some(value) = host.probe(column, slot)? {
                    group
                        .get_or_insert(entity)
                        .add_component(StructCapture::new(component.clone(), value));
                }
            }
        }

        trace!(
            group = %id,
            locators = locators.len(),
            entities = group.entities.len(),
            "captured group"
        );
        Ok(group)
    }

    fn get_or_insert(&mut self, id: EntityId) -> &mut EntitySnapshot {
        let idx = *self.index.entry(id).or_insert_with(|| {
            self.entities.push(EntitySnapshot::new(id));
            self.entities.len() - 1
        });
        &mut self.entities[idx]
    }

    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Id of the root this group belongs to.
    #[must_use]
    pub const fn root(&self) -> EngineId {
        self.root
    }

    /// Captured entities, in discovery order.
    #[must_use]
    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    /// Look up a captured entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.index.get(&id).map(|&idx| &self.entities[idx])
    }

    /// Whether the host reported locator data for this group.
    #[must_use]
    pub const fn has_locators(&self) -> bool {
        self.has_locators
    }

    /// Entities carrying the given component kind.
    pub fn with_component<'a>(
        &'a self,
        key: &'a ComponentTypeKey,
    ) -> impl Iterator<Item = &'a EntitySnapshot> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.component(key).is_some())
    }
}
