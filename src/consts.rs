//! Shared numeric constants for the moodboard engine.

// ── Items ───────────────────────────────────────────────────────

/// Smallest width or height an item may have, in canvas units.
pub const MIN_ITEM_SIZE: f64 = 20.0;

/// Offset applied to pasted and duplicated items so they do not sit exactly
/// on top of their source.
pub const PASTE_OFFSET: f64 = 20.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undoable steps kept by the history.
pub const HISTORY_DEPTH: usize = 30;

// ── Persistence ─────────────────────────────────────────────────

/// Quiet period after the last mutation before an auto-save fires.
pub const SAVE_DEBOUNCE_MS: u64 = 2000;

// ── Grid ────────────────────────────────────────────────────────

/// Default grid spacing in canvas units.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

// ── Camera ──────────────────────────────────────────────────────

/// Lower zoom bound.
pub const MIN_ZOOM: f64 = 0.1;

/// Upper zoom bound.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplicative step used by zoom-in / zoom-out commands.
pub const ZOOM_STEP: f64 = 1.2;

/// Wheel delta (pixels) that corresponds to one zoom step.
pub const WHEEL_ZOOM_PIXELS: f64 = 100.0;

// ── Gestures ────────────────────────────────────────────────────

/// Angle added to the raw pointer angle so the rotate handle, which sits
/// above the item, reads as 0°.
pub const ROTATE_HANDLE_OFFSET_DEG: f64 = 90.0;

/// Arrow-key nudge distance in canvas units.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with Shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;
