//! Transform controller: drag, resize, rotate and nudge.
//!
//! Every gesture follows the same lifecycle:
//!
//! 1. **Seed**: capture start values when the pointer goes down.
//! 2. **Preview**: on each pointer-move, recompute from the seed and write
//!    straight into the store. Nothing is pushed to history.
//! 3. **Commit**: on pointer-up the editor pushes one history entry for
//!    the whole gesture if anything changed.
//!
//! Functions here only touch the store; history and selection belong to the
//! editor. Locked items are never modified.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::camera::{Camera, Point, Rect, snap_if};
use crate::consts::{MIN_ITEM_SIZE, ROTATE_HANDLE_OFFSET_DEG};
use crate::doc::{BoardSettings, ItemId, ItemStore};
use crate::hit::ResizeAnchor;
use crate::input::DragSeed;

/// Grid snapping parameters in effect for a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapping {
    pub enabled: bool,
    pub grid_size: f64,
}

impl Snapping {
    /// No snapping.
    pub const OFF: Snapping = Snapping { enabled: false, grid_size: 0.0 };

    #[must_use]
    pub fn from_settings(settings: &BoardSettings) -> Self {
        Self { enabled: settings.snap_to_grid, grid_size: settings.grid_size }
    }

    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        snap_if(self.enabled, value, self.grid_size)
    }
}

// =============================================================================
// DRAG
// =============================================================================

/// Seeds for every unlocked item among `ids` that exists in the store.
#[must_use]
pub fn drag_seeds(store: &ItemStore, ids: &[ItemId]) -> Vec<DragSeed> {
    ids.iter()
        .filter_map(|id| store.get(id))
        .filter(|item| !item.locked)
        .map(|item| DragSeed { id: item.id, start_x: item.position.x, start_y: item.position.y })
        .collect()
}

/// Move every seeded item to `start + screen_delta / effective_zoom`,
/// snapping each axis when enabled. Returns whether any position changed.
pub fn apply_drag(store: &mut ItemStore, seeds: &[DragSeed], screen_delta: Point, camera: &Camera, snapping: Snapping) -> bool {
    let dx = camera.screen_dist_to_canvas(screen_delta.x);
    let dy = camera.screen_dist_to_canvas(screen_delta.y);
    let mut changed = false;
    for seed in seeds {
        let Some(item) = store.get_mut(&seed.id) else {
            continue;
        };
        if item.locked {
            continue;
        }
        let x = snapping.apply(seed.start_x + dx);
        let y = snapping.apply(seed.start_y + dy);
        if item.position.x != x || item.position.y != y {
            item.position.x = x;
            item.position.y = y;
            changed = true;
        }
    }
    changed
}

/// Restore seeded items to their start positions.
pub fn revert_drag(store: &mut ItemStore, seeds: &[DragSeed]) {
    for seed in seeds {
        if let Some(item) = store.get_mut(&seed.id) {
            item.position.x = seed.start_x;
            item.position.y = seed.start_y;
        }
    }
}

// =============================================================================
// RESIZE
// =============================================================================

/// Compute new bounds for a resize of `start` by the canvas-space `delta`
/// dragged on `anchor`.
///
/// The edge or corner opposite the handle stays fixed. Each affected
/// dimension is snapped independently when enabled and never drops below
/// [`MIN_ITEM_SIZE`].
#[must_use]
pub fn resized_bounds(start: Rect, anchor: ResizeAnchor, delta: Point, snapping: Snapping) -> Rect {
    let mut out = start;

    let xs = anchor.x_sign();
    if xs != 0.0 {
        let width = snapping.apply(start.width + xs * delta.x).max(MIN_ITEM_SIZE);
        out.width = width;
        if xs < 0.0 {
            out.x = start.right() - width;
        }
    }

    let ys = anchor.y_sign();
    if ys != 0.0 {
        let height = snapping.apply(start.height + ys * delta.y).max(MIN_ITEM_SIZE);
        out.height = height;
        if ys < 0.0 {
            out.y = start.bottom() - height;
        }
    }

    out
}

/// Write `bounds` into item `id` unless it is locked. Returns whether
/// anything changed.
pub fn apply_bounds(store: &mut ItemStore, id: &ItemId, bounds: Rect) -> bool {
    let Some(item) = store.get_mut(id) else {
        return false;
    };
    if item.locked {
        return false;
    }
    let before = item.bounds();
    item.position.x = bounds.x;
    item.position.y = bounds.y;
    item.size.width = bounds.width.max(MIN_ITEM_SIZE);
    item.size.height = bounds.height.max(MIN_ITEM_SIZE);
    item.bounds() != before
}

// =============================================================================
// ROTATE
// =============================================================================

/// Rotation in degrees for a pointer at `pointer` rotating around `center`.
///
/// The rotate handle sits straight above the item, so the raw `atan2` angle
/// is shifted by [`ROTATE_HANDLE_OFFSET_DEG`] to make that position 0°. No
/// snapping is applied.
#[must_use]
pub fn rotation_for_pointer(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + ROTATE_HANDLE_OFFSET_DEG
}

/// Set the rotation of item `id` unless it is locked. Returns whether it changed.
pub fn apply_rotation(store: &mut ItemStore, id: &ItemId, degrees: f64) -> bool {
    let Some(item) = store.get_mut(id) else {
        return false;
    };
    if item.locked || item.rotation == degrees {
        return false;
    }
    item.rotation = degrees;
    true
}

// =============================================================================
// NUDGE
// =============================================================================

/// Offset every unlocked item among `ids` by `(dx, dy)` canvas units.
/// Returns the number of items moved.
pub fn nudge(store: &mut ItemStore, ids: &[ItemId], dx: f64, dy: f64) -> usize {
    let mut moved = 0;
    for id in ids {
        if let Some(item) = store.get_mut(id) {
            if item.locked {
                continue;
            }
            item.position.x += dx;
            item.position.y += dy;
            moved += 1;
        }
    }
    moved
}
