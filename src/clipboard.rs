//! Clipboard and duplication.
//!
//! The clipboard is a single slot holding deep copies of item data (no ids).
//! Pasting materialises those drafts under fresh ids, offset from their
//! source, stacked above everything currently on the board.

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod clipboard_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::doc::{GroupId, Item, ItemDraft, ItemId, ItemStore};

/// Single-slot, session-scoped clipboard.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entries: Vec<ItemDraft>,
}

impl Clipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with copies of `items`, kept in paint order.
    pub fn copy<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a Item>,
    {
        self.entries = items.into_iter().map(ItemDraft::from_item).collect();
    }

    #[must_use]
    pub fn entries(&self) -> &[ItemDraft] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Selected items in paint order, as drafts ready for pasting.
#[must_use]
pub fn drafts_for(store: &ItemStore, ids: &[ItemId]) -> Vec<ItemDraft> {
    store
        .paint_order()
        .into_iter()
        .filter(|i| ids.contains(&i.id))
        .map(ItemDraft::from_item)
        .collect()
}

/// Append `drafts` to the store under fresh ids and return those ids.
///
/// Each copy is offset by `(offset, offset)` from its source and receives a
/// `z` above the current maximum, in draft order. Group tags are remapped so
/// pasted members form new groups instead of joining the originals.
#[allow(clippy::cast_possible_wrap)]
pub fn paste_drafts(store: &mut ItemStore, drafts: &[ItemDraft], offset: f64) -> Vec<ItemId> {
    if drafts.is_empty() {
        return Vec::new();
    }
    let base_z = store.next_z();
    let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
    let mut new_ids = Vec::with_capacity(drafts.len());

    for (rank, draft) in drafts.iter().enumerate() {
        let mut draft = draft.clone();
        draft.position.x += offset;
        draft.position.y += offset;
        draft.position.z = base_z + rank as i64;
        draft.group_id = draft
            .group_id
            .map(|g| *group_map.entry(g).or_insert_with(Uuid::new_v4));
        let id = Uuid::new_v4();
        store.insert(draft.into_item(id));
        new_ids.push(id);
    }
    new_ids
}
