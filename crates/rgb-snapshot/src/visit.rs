//! Read-only traversal over a snapshot tree.
//!
//! Renderers and exporters implement [`Visitor`] and hand it to [`walk`],
//! which visits roots → groups → entities → components depth first.

use crate::{EntitySnapshot, GroupSnapshot, RootSnapshot, SnapshotTree, StructCapture};

/// Callbacks for [`walk`]. Every hook defaults to doing nothing.
pub trait Visitor {
    fn enter_root(&mut self, _root: &RootSnapshot) {}
    fn leave_root(&mut self, _root: &RootSnapshot) {}
    fn enter_group(&mut self, _group: &GroupSnapshot) {}
    fn leave_group(&mut self, _group: &GroupSnapshot) {}
    fn enter_entity(&mut self, _entity: &EntitySnapshot) {}
    fn leave_entity(&mut self, _entity: &EntitySnapshot) {}
    fn component(&mut self, _capture: &StructCapture) {}
}

/// Walk the whole tree depth first.
pub fn walk<V: Visitor + ?Sized>(tree: &SnapshotTree, visitor: &mut V) {
    for root in tree.roots() {
        walk_root(root, visitor);
    }
}

/// Walk a single root depth first.
pub fn walk_root<V: Visitor + ?Sized>(root: &RootSnapshot, visitor: &mut V) {
    visitor.enter_root(root);
    for group in root.groups() {
        visitor.enter_group(group);
        for entity in group.entities() {
            visitor.enter_entity(entity);
            for capture in entity.components() {
                visitor.component(capture);
            }
            visitor.leave_entity(entity);
        }
        visitor.leave_group(group);
    }
    visitor.leave_root(root);
}

/// Node counts of a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub roots: usize,
    pub groups: usize,
    pub entities: usize,
    pub components: usize,
}

impl TreeStats {
    #[must_use]
    pub fn of(tree: &SnapshotTree) -> Self {
        let mut stats = Self::default();
        walk(tree, &mut stats);
        stats
    }
}

impl Visitor for TreeStats {
    fn enter_root(&mut self, _root: &RootSnapshot) {
        self.roots += 1;
    }

    fn enter_group(&mut self, _group: &GroupSnapshot) {
        self.groups += 1;
    }

    fn enter_entity(&mut self, _entity: &EntitySnapshot) {
        self.entities += 1;
    }

    fn component(&mut self, _capture: &StructCapture) {
        self.components += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentValue, EntityId, GroupId, MemoryHost};
    use std::sync::Arc;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Visitor for Trace {
        fn enter_root(&mut self, root: &RootSnapshot) {
            self.0.push(format!("root {}", root.label()));
        }
        fn enter_group(&mut self, group: &GroupSnapshot) {
            self.0.push(format!("group {}", group.id()));
        }
        fn enter_entity(&mut self, entity: &EntitySnapshot) {
            self.0.push(format!("entity {}", entity.id()));
        }
        fn component(&mut self, capture: &StructCapture) {
            self.0.push(format!("component {}", capture.component()));
        }
        fn leave_root(&mut self, _root: &RootSnapshot) {
            self.0.push("end".to_string());
        }
    }

    #[test]
    fn test_walk_is_depth_first() {
        let host = Arc::new(MemoryHost::new());
        host.spawn(
            GroupId::new(1),
            EntityId::new(4),
            [
                ("Position".into(), ComponentValue::json(serde_json::json!([0, 1]))),
                ("Health".into(), ComponentValue::json(20.into())),
            ],
        );
        host.insert_group(GroupId::new(2));

        let mut tree = SnapshotTree::new();
        tree.attach(&host, Some("world")).unwrap();

        let mut trace = Trace::default();
        walk(&tree, &mut trace);
        assert_eq!(
            trace.0,
            [
                "root world",
                "group g1",
                "entity e4",
                "component Position",
                "component Health",
                "group g2",
                "end",
            ]
        );

        assert_eq!(
            TreeStats::of(&tree),
            TreeStats {
                roots: 1,
                groups: 2,
                entities: 1,
                components: 2,
            }
        );
    }
}
