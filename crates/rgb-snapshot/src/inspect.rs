//! The inspection contract a host engine implements.
//!
//! Hosts expose their grouped column storage through [`Inspect`] instead of
//! letting the snapshot layer reach into private layout. Every method takes
//! `&self`, so nothing the snapshot layer does can allocate or move data in
//! host storage.
//!
//! # Preconditions
//!
//! Methods are only called while the host is quiescent (e.g. between
//! simulation steps). Synchronizing against concurrent mutation is the
//! host's job.

use thiserror::Error;

use crate::{
    ColumnHandle, ComponentTypeKey, ComponentValue, EntityId, GroupId, LocalSlot, StoreHandle,
};

/// Failure reported by a host while it is being inspected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// A group reported by `groups()` disappeared before it was read.
    #[error("group vanished: {0}")]
    GroupVanished(GroupId),

    /// The column store behind a handle is gone.
    #[error("column store vanished: {0}")]
    StoreVanished(StoreHandle),

    /// The column behind a handle is gone.
    #[error("column vanished: {0}")]
    ColumnVanished(ColumnHandle),

    /// Host-specific failure.
    #[error("host error: {0}")]
    Host(String),
}

/// Read-only view of a host's grouped, column-oriented entity storage.
pub trait Inspect {
    /// Current groups with a handle to each group's column storage.
    fn groups(&self) -> Result<Vec<(GroupId, StoreHandle)>, InspectError>;

    /// Entity → slot table of a group, in the host's iteration order.
    ///
    /// `None` when the host keeps no locator data for the group.
    fn locators(&self, group: GroupId) -> Result<Option<Vec<(EntityId, LocalSlot)>>, InspectError>;

    /// Component columns of one group's storage.
    fn columns(
        &self,
        store: StoreHandle,
    ) -> Result<Vec<(ComponentTypeKey, ColumnHandle)>, InspectError>;

    /// Copy the value stored at `slot`, if any.
    ///
    /// Must be a pure read: a miss never creates an entry.
    fn probe(
        &self,
        column: ColumnHandle,
        slot: LocalSlot,
    ) -> Result<Option<ComponentValue>, InspectError>;

    /// Names of the systems registered with the host, for display.
    fn systems(&self) -> Result<Vec<String>, InspectError> {
        Ok(Vec::new())
    }
}
