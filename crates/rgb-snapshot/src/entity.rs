//! Captured entities.

use smallvec::SmallVec;

use crate::{ComponentTypeKey, EntityId, StructCapture};

/// One entity's identity plus the components captured for it.
///
/// Components are kept in encounter order; the same component kind may
/// appear twice if the host reports it twice.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    id: EntityId,
    components: SmallVec<[StructCapture; 4]>,
}

impl EntitySnapshot {
    /// Create an entity with no captured components.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            components: SmallVec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Captured components, in encounter order.
    #[must_use]
    pub fn components(&self) -> &[StructCapture] {
        &self.components
    }

    /// First capture of the given component kind.
    #[must_use]
    pub fn component(&self, key: &ComponentTypeKey) -> Option<&StructCapture> {
        self.components.iter().find(|c| c.component() == key)
    }

    /// Append a capture.
    pub fn add_component(&mut self, capture: StructCapture) {
        self.components.push(capture);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
