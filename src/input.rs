//! Input model: interaction modes, modifier keys, mouse buttons, and the
//! gesture state machine.
//!
//! `InteractionMode` and `Modifiers` capture the user's intent at the time of
//! a pointer event. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up, carrying the start values every preview is
//! computed from so the terminal event can commit a single history entry.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::doc::ItemId;
use crate::hit::ResizeAnchor;

/// What a primary-button drag on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Click selects, drag moves items or draws a rubber band (default).
    #[default]
    Select,
    /// Every drag pans the view.
    Pan,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn primary(self) -> bool {
        self.ctrl || self.meta
    }

    /// Any modifier that turns a click into a selection toggle.
    #[must_use]
    pub fn toggles_selection(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"z"`, `"ArrowUp"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Starting position of one item taking part in a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSeed {
    pub id: ItemId,
    pub start_x: f64,
    pub start_y: f64,
}

/// Internal state for the input state machine.
///
/// Each active variant carries the context needed to compute previews from
/// the gesture start, never from the previous frame.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// The user is moving one or more items.
    DraggingItems {
        /// Screen-space pointer position at gesture start.
        start_screen: Point,
        /// Items being moved and where they started.
        seeds: Vec<DragSeed>,
        /// Whether any preview has changed a position yet.
        moved: bool,
    },
    /// The user is resizing an item by one of its eight handles.
    ResizingItem {
        id: ItemId,
        anchor: ResizeAnchor,
        /// Screen-space pointer position at gesture start.
        start_screen: Point,
        orig_x: f64,
        orig_y: f64,
        orig_w: f64,
        orig_h: f64,
        moved: bool,
    },
    /// The user is rotating an item by its rotate handle.
    RotatingItem {
        id: ItemId,
        /// Canvas-space center of the item; the rotation pivot.
        center: Point,
        /// Rotation in degrees at gesture start, restored if nothing changes.
        orig_rotation: f64,
        moved: bool,
    },
    /// The user is dragging a rubber band over empty canvas.
    BoxSelecting {
        /// Canvas-space corner where the drag started.
        anchor: Point,
        /// Canvas-space position of the latest pointer event.
        current: Point,
    },
}

impl InputState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
