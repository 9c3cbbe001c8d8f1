//! Identifiers shared between the snapshot tree and inspected hosts.
//!
//! Every key the host hands out is wrapped in a newtype so a group id can
//! never be passed where a slot is expected.

use std::{borrow::Cow, fmt};

macro_rules! raw_id {
    ($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value.
            #[must_use]
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Get the raw value.
            #[must_use]
            pub const fn raw(self) -> $inner {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

raw_id!(
    /// Key of one storage partition within an engine.
    ///
    /// Unique within an engine at any instant; groups can appear and
    /// disappear between refreshes.
    GroupId(u32),
    "g"
);

raw_id!(
    /// Key of one entity within a group.
    EntityId(u32),
    "e"
);

raw_id!(
    /// Row of an entity inside its group's columns.
    LocalSlot(u32),
    "#"
);

raw_id!(
    /// Identity of an attached engine, assigned by the snapshot tree.
    ///
    /// Monotonically increasing and never reused within one tree.
    EngineId(u32),
    "engine#"
);

raw_id!(
    /// Host token for the column storage of one group.
    StoreHandle(u64),
    "store#"
);

raw_id!(
    /// Host token for one component column.
    ColumnHandle(u64),
    "column#"
);

/// Identifier for a component kind stored column-wise within a group.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeKey(Cow<'static, str>);

impl ComponentTypeKey {
    /// Create a key from a static type name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Key for a Rust type, using its short name.
    ///
    /// Only the outer module path is stripped. Generic arguments are kept
    /// verbatim, so `Vec<a::Pos>` and `Vec<b::Pos>` stay distinct.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = core::any::type_name::<T>();
        let (path, args) = full.split_at(full.find('<').unwrap_or(full.len()));
        let short = path.rsplit("::").next().unwrap_or(path);
        if args.is_empty() {
            Self::from_static(short)
        } else {
            Self(Cow::Owned(format!("{short}{args}")))
        }
    }

    /// Get the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ComponentTypeKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ComponentTypeKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Debug for ComponentTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeKey({})", self.0)
    }
}

impl fmt::Display for ComponentTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(GroupId::new(3).to_string(), "g3");
        assert_eq!(EntityId::new(7).to_string(), "e7");
        assert_eq!(LocalSlot::new(2).to_string(), "#2");
        assert_eq!(format!("{:?}", EngineId::new(1)), "EngineId(1)");
    }

    #[test]
    fn test_type_key_strips_module_path() {
        let key = ComponentTypeKey::of::<Position>();
        assert_eq!(key.as_str(), "Position");
        assert_eq!(key, ComponentTypeKey::from("Position"));
        assert_eq!(key, ComponentTypeKey::from(String::from("Position")));
    }

    #[test]
    fn test_type_key_keeps_generic_arguments() {
        let key = ComponentTypeKey::of::<Vec<Position>>();
        assert!(key.as_str().starts_with("Vec<"), "{key}");
        assert!(key.as_str().ends_with("::Position>"), "{key}");
        assert_ne!(key, ComponentTypeKey::of::<Vec<u8>>());
        assert_eq!(ComponentTypeKey::of::<Vec<u8>>().as_str(), "Vec<u8>");
    }
}
