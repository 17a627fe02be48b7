#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point, Rect};
use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{Item, ItemId, ItemStore};
use crate::selection::Selection;

/// Which part of an item was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
}

/// Position of a resize handle on the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Where this handle sits on `bounds`.
    #[must_use]
    pub fn handle_point(self, bounds: &Rect) -> Point {
        let cx = bounds.x + bounds.width / 2.0;
        let cy = bounds.y + bounds.height / 2.0;
        match self {
            Self::N => Point::new(cx, bounds.y),
            Self::Ne => Point::new(bounds.right(), bounds.y),
            Self::E => Point::new(bounds.right(), cy),
            Self::Se => Point::new(bounds.right(), bounds.bottom()),
            Self::S => Point::new(cx, bounds.bottom()),
            Self::Sw => Point::new(bounds.x, bounds.bottom()),
            Self::W => Point::new(bounds.x, cy),
            Self::Nw => Point::new(bounds.x, bounds.y),
        }
    }

    /// Horizontal direction the handle drags the edge: -1 west, 1 east, 0 none.
    #[must_use]
    pub fn x_sign(self) -> f64 {
        match self {
            Self::Ne | Self::E | Self::Se => 1.0,
            Self::Nw | Self::W | Self::Sw => -1.0,
            Self::N | Self::S => 0.0,
        }
    }

    /// Vertical direction the handle drags the edge: -1 north, 1 south, 0 none.
    #[must_use]
    pub fn y_sign(self) -> f64 {
        match self {
            Self::Se | Self::S | Self::Sw => 1.0,
            Self::Ne | Self::N | Self::Nw => -1.0,
            Self::E | Self::W => 0.0,
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub item_id: ItemId,
    pub part: HitPart,
}

/// Canvas-space position of the rotate handle of `item`.
#[must_use]
pub fn rotate_handle_point(item: &Item, camera: &Camera) -> Point {
    let b = item.bounds();
    Point::new(b.x + b.width / 2.0, b.y - camera.screen_dist_to_canvas(ROTATE_HANDLE_OFFSET_PX))
}

fn within(a: Point, b: Point, radius: f64) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy <= radius * radius
}

/// Test which item (if any) is under `canvas_pt`.
///
/// Handles of a single selected, unlocked, visible item are checked first;
/// then item bodies from the top of the paint order down. Hidden items are
/// never hit. Bounds are axis-aligned; rotation is not considered.
#[must_use]
pub fn hit_test(canvas_pt: Point, store: &ItemStore, camera: &Camera, selection: &Selection) -> Option<Hit> {
    if let Some(id) = selection.single() {
        if let Some(item) = store.get(&id).filter(|i| !i.hidden && !i.locked) {
            let radius = camera.screen_dist_to_canvas(HANDLE_RADIUS_PX);
            if within(canvas_pt, rotate_handle_point(item, camera), radius) {
                return Some(Hit { item_id: id, part: HitPart::RotateHandle });
            }
            let bounds = item.bounds();
            for anchor in ResizeAnchor::ALL {
                if within(canvas_pt, anchor.handle_point(&bounds), radius) {
                    return Some(Hit { item_id: id, part: HitPart::ResizeHandle(anchor) });
                }
            }
        }
    }

    store
        .paint_order()
        .into_iter()
        .rev()
        .find(|i| !i.hidden && i.bounds().contains(canvas_pt))
        .map(|i| Hit { item_id: i.id, part: HitPart::Body })
}
