//! Selection manager: the set of selected item ids.
//!
//! Selection is not an entity of its own; it is cleared on board load, on a
//! plain click on empty canvas, after deletes and after undo/redo. Hidden
//! items never enter a pointer-driven selection. Locked items may be
//! selected for inspection; transform commands skip them.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashSet;

use crate::camera::Rect;
use crate::doc::{Item, ItemId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: HashSet<ItemId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection becomes exactly `{id}`.
    pub fn select_single(&mut self, id: ItemId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    /// Add `id` if absent, remove it if present (modifier-click).
    pub fn toggle(&mut self, id: ItemId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Union `ids` into the current selection.
    pub fn select_many<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids.extend(ids);
    }

    /// Replace the selection with `ids`.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids.clear();
        self.ids.extend(ids);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Select every non-hidden item.
    pub fn select_all(&mut self, items: &[Item]) {
        self.ids = items.iter().filter(|i| !i.hidden).map(|i| i.id).collect();
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The single selected id, when exactly one item is selected.
    #[must_use]
    pub fn single(&self) -> Option<ItemId> {
        if self.ids.len() == 1 { self.ids.iter().next().copied() } else { None }
    }

    /// Selected ids in a stable (sorted) order.
    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.ids.iter().copied().collect();
        ids.sort();
        ids
    }
}

/// Ids of the items a rubber band over `rect` picks up: every non-hidden
/// item whose bounds intersect it. Locked items are included.
#[must_use]
pub fn box_select(items: &[Item], rect: &Rect) -> Vec<ItemId> {
    items
        .iter()
        .filter(|i| !i.hidden && i.bounds().intersects(rect))
        .map(|i| i.id)
        .collect()
}
