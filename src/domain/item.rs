//! Inventory items
//!
//! An [`InventoryItem`] identifies one exportable configuration object as
//! reported by the inventory source.

use super::ids::{EntityKind, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One exportable configuration object
///
/// `name` is unique within a kind for practical purposes but this is not
/// enforced; it is only used for log messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Kind of the object
    pub kind: EntityKind,

    /// Platform identifier
    pub id: ItemId,

    /// Display name
    pub name: String,
}

impl InventoryItem {
    /// Creates a new inventory item
    pub fn new(kind: EntityKind, id: ItemId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.name, self.id)
    }
}
