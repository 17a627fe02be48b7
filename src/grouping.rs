//! Grouping engine.
//!
//! A group is nothing more than a shared `group_id` tag. Ungrouping is a
//! property of the group: it clears the tag on every member, selected or not.

#[cfg(test)]
#[path = "grouping_test.rs"]
mod grouping_test;

use std::collections::HashSet;

use uuid::Uuid;

use crate::doc::{GroupId, ItemId, ItemStore};

/// Tag every item in `ids` with one fresh group id.
///
/// Needs at least two existing items; returns `None` (and changes nothing)
/// otherwise.
pub fn group(store: &mut ItemStore, ids: &[ItemId]) -> Option<GroupId> {
    let wanted: HashSet<&ItemId> = ids.iter().filter(|id| store.contains(id)).collect();
    if wanted.len() < 2 {
        return None;
    }
    let group_id = Uuid::new_v4();
    for item in store.iter_mut() {
        if wanted.contains(&item.id) {
            item.group_id = Some(group_id);
        }
    }
    Some(group_id)
}

/// Distinct group ids carried by the items in `ids`.
#[must_use]
pub fn groups_of(store: &ItemStore, ids: &[ItemId]) -> HashSet<GroupId> {
    ids.iter()
        .filter_map(|id| store.get(id))
        .filter_map(|item| item.group_id)
        .collect()
}

/// Dissolve every group touched by `ids`, clearing the tag on all of its
/// members. Returns the number of groups dissolved.
pub fn ungroup(store: &mut ItemStore, ids: &[ItemId]) -> usize {
    let groups = groups_of(store, ids);
    if groups.is_empty() {
        return 0;
    }
    for item in store.iter_mut() {
        if item.group_id.is_some_and(|g| groups.contains(&g)) {
            item.group_id = None;
        }
    }
    groups.len()
}

/// Ids of every item tagged with `group_id`, in insertion order.
#[must_use]
pub fn members(store: &ItemStore, group_id: GroupId) -> Vec<ItemId> {
    store
        .iter()
        .filter(|i| i.group_id == Some(group_id))
        .map(|i| i.id)
        .collect()
}

/// `ids` plus every co-member of any group they belong to. Original ids keep
/// their order and come first.
#[must_use]
pub fn expand_to_groups(store: &ItemStore, ids: &[ItemId]) -> Vec<ItemId> {
    let groups = groups_of(store, ids);
    let mut out: Vec<ItemId> = ids.to_vec();
    let mut seen: HashSet<ItemId> = ids.iter().copied().collect();
    for item in store.iter() {
        if item.group_id.is_some_and(|g| groups.contains(&g)) && seen.insert(item.id) {
            out.push(item.id);
        }
    }
    out
}
