#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]

//! RGB Snapshot - live inspection trees for grouped column-store ECS hosts.
//!
//! Hosts expose their storage through the [`Inspect`] trait. A
//! [`SnapshotTree`] pulls that data into owned, read-only copies that an
//! inspector UI or exporter can traverse without touching the host.
//!
//! # Key Concepts
//!
//! - **Group**: a partition of entities sharing the same component layout
//! - **Column store**: per-group, per-component table indexed by slot
//! - **Locator map**: per-group table from entity id to slot
//! - **Snapshot**: point-in-time copy of host state; never aliases host memory
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rgb_snapshot::{ComponentValue, EntityId, GroupId, MemoryHost, SnapshotTree};
//!
//! let host = Arc::new(MemoryHost::new());
//! host.spawn(
//!     GroupId::new(0),
//!     EntityId::new(1),
//!     [("Health".into(), ComponentValue::json(20.into()))],
//! );
//!
//! let mut tree = SnapshotTree::new();
//! let engine = tree.attach(&host, Some("server")).unwrap().id();
//!
//! tree.subscribe(|tree| {
//!     let _ = tree.roots();
//! });
//! tree.refresh().unwrap();
//!
//! let group = &tree.root(engine).unwrap().groups()[0];
//! assert_eq!(group.entities()[0].id(), EntityId::new(1));
//! ```

mod capture;
mod entity;
mod error;
mod group;
mod host;
mod id;
mod inspect;
mod observer;
mod root;
mod schedule;
mod tree;
pub mod visit;

pub use capture::{ComponentValue, StructCapture};
pub use entity::EntitySnapshot;
pub use error::{SnapshotError, SnapshotResult};
pub use group::GroupSnapshot;
pub use host::MemoryHost;
pub use id::{
    ColumnHandle, ComponentTypeKey, EngineId, EntityId, GroupId, LocalSlot, StoreHandle,
};
pub use inspect::{Inspect, InspectError};
pub use observer::{ObserverId, ObserverSet};
pub use root::{EngineHandle, RootCapture, RootSnapshot};
pub use schedule::{DEFAULT_INTERVAL, RefreshSchedule, SnapshotConfig};
pub use tree::SnapshotTree;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ComponentTypeKey, ComponentValue, EntityId, GroupId, Inspect, LocalSlot, MemoryHost,
        SnapshotTree,
    };
}
