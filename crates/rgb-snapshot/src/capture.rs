//! Captured component values.
//!
//! A capture owns a copy of the host's data. Nothing in here points back
//! into host storage, so later host-side mutation is never visible through
//! a stale snapshot.

use serde::Serialize;

use crate::{ComponentTypeKey, InspectError};

/// Payload of one captured component, tagged by how the host could copy it.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// Structured value for components the host can serialize.
    Json(serde_json::Value),
    /// Raw bytes copied out of a plain-data column.
    Bytes(Box<[u8]>),
    /// Component that cannot be serialized, with an optional summary
    /// (byte sizes, handle counts, ...).
    Opaque { summary: Option<String> },
}

impl ComponentValue {
    /// Wrap an already built JSON value.
    #[must_use]
    pub const fn json(value: serde_json::Value) -> Self {
        Self::Json(value)
    }

    /// Serialize a component value into a JSON capture.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, InspectError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| InspectError::Host(format!("serialize failed: {e}")))
    }

    /// Copy raw component bytes.
    #[must_use]
    pub fn bytes(data: &[u8]) -> Self {
        Self::Bytes(data.into())
    }

    /// Opaque component with an optional summary.
    #[must_use]
    pub fn opaque(summary: Option<String>) -> Self {
        Self::Opaque { summary }
    }

    /// Whether the value carries no inspectable data.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque { .. })
    }

    /// Get the JSON payload, if this is a JSON capture.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// One component instance captured at inspection time.
#[derive(Debug, Clone, PartialEq)]
pub struct StructCapture {
    component: ComponentTypeKey,
    value: ComponentValue,
}

impl StructCapture {
    #[must_use]
    pub const fn new(component: ComponentTypeKey, value: ComponentValue) -> Self {
        Self { component, value }
    }

    /// Component kind this value was read from.
    #[must_use]
    pub const fn component(&self) -> &ComponentTypeKey {
        &self.component
    }

    #[must_use]
    pub const fn value(&self) -> &ComponentValue {
        &self.value
    }

    /// Mutable access to the captured copy. Never reaches the host.
    pub fn value_mut(&mut self) -> &mut ComponentValue {
        &mut self.value
    }

    #[must_use]
    pub fn into_value(self) -> ComponentValue {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[test]
    fn test_from_serialize() {
        let value = ComponentValue::from_serialize(&Position { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(value, ComponentValue::json(serde_json::json!({"x": 1.0, "y": 2.0})));
        assert!(!value.is_opaque());
    }

    #[test]
    fn test_bytes_are_copied() {
        let mut raw = vec![1u8, 2, 3];
        let value = ComponentValue::bytes(&raw);
        raw[0] = 9;
        assert_eq!(value, ComponentValue::Bytes(vec![1u8, 2, 3].into_boxed_slice()));
    }

    #[test]
    fn test_mutating_capture_keeps_clone_intact() {
        let original = StructCapture::new("Health".into(), ComponentValue::json(20.into()));
        let mut copy = original.clone();
        *copy.value_mut() = ComponentValue::opaque(Some("gone".into()));

        assert_eq!(original.value().as_json(), Some(&serde_json::json!(20)));
        assert!(copy.value().is_opaque());
    }
}
