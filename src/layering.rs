//! Layering engine: z-order maintenance.
//!
//! Z values are integers that need not be contiguous. Multi-item promotions
//! and demotions rank the moved items by their current paint order so their
//! mutual stacking survives the move.

#[cfg(test)]
#[path = "layering_test.rs"]
mod layering_test;

use std::collections::{HashMap, HashSet};

use crate::doc::{ItemId, ItemStore};

/// Ids from `ids` present in the store, ordered bottom-to-top by current
/// paint order (z ascending, insertion order on ties).
fn ranked(store: &ItemStore, ids: &[ItemId]) -> Vec<ItemId> {
    let wanted: HashSet<&ItemId> = ids.iter().collect();
    store
        .paint_order()
        .into_iter()
        .filter(|i| wanted.contains(&i.id))
        .map(|i| i.id)
        .collect()
}

fn assign(store: &mut ItemStore, z_by_id: &HashMap<ItemId, i64>) {
    for item in store.iter_mut() {
        if let Some(z) = z_by_id.get(&item.id) {
            item.position.z = *z;
        }
    }
}

/// Raise `ids` above every other item: `z = maxZ + 1 + rank`.
///
/// Returns the number of items reassigned.
#[allow(clippy::cast_possible_wrap)]
pub fn bring_to_front(store: &mut ItemStore, ids: &[ItemId]) -> usize {
    let order = ranked(store, ids);
    let Some(max_z) = store.max_z() else {
        return 0;
    };
    let z_by_id: HashMap<ItemId, i64> = order
        .iter()
        .enumerate()
        .map(|(rank, id)| (*id, max_z + 1 + rank as i64))
        .collect();
    assign(store, &z_by_id);
    order.len()
}

/// Lower `ids` beneath every other item: `z = minZ - count + rank`.
///
/// Returns the number of items reassigned.
#[allow(clippy::cast_possible_wrap)]
pub fn send_to_back(store: &mut ItemStore, ids: &[ItemId]) -> usize {
    let order = ranked(store, ids);
    let Some(min_z) = store.min_z() else {
        return 0;
    };
    let count = order.len() as i64;
    let z_by_id: HashMap<ItemId, i64> = order
        .iter()
        .enumerate()
        .map(|(rank, id)| (*id, min_z - count + rank as i64))
        .collect();
    assign(store, &z_by_id);
    order.len()
}

/// Apply an explicit front-to-back ordering, as produced by dragging rows in
/// a layer list: `z = len - index`, so index 0 ends up topmost.
///
/// Ids missing from the store are skipped without consuming an index.
/// Returns the number of items reassigned.
#[allow(clippy::cast_possible_wrap)]
pub fn reorder(store: &mut ItemStore, front_to_back: &[ItemId]) -> usize {
    let present: Vec<ItemId> = front_to_back
        .iter()
        .filter(|id| store.contains(id))
        .copied()
        .collect();
    let len = present.len() as i64;
    let z_by_id: HashMap<ItemId, i64> = present
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, len - index as i64))
        .collect();
    assign(store, &z_by_id);
    present.len()
}

/// Every item id ordered top-to-bottom, the order a layer list displays.
#[must_use]
pub fn front_to_back(store: &ItemStore) -> Vec<ItemId> {
    store.paint_order().into_iter().rev().map(|i| i.id).collect()
}
