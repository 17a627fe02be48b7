//! Geometry and coordinate-space conversions.
//!
//! Three spaces are in play: screen pixels as reported by pointer events,
//! canvas units (the infinite board, after pan and zoom are removed), and
//! snapped grid coordinates. Everything here is pure; callers guard against
//! non-finite input coming from malformed persisted data.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle. `width` and `height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build the rectangle spanned by two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned overlap test. Rectangles sharing only an edge count as
    /// overlapping.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    /// Whether `pt` lies inside or on the border of the rectangle.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }
}

/// Free-function form of [`Rect::intersects`].
#[must_use]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.intersects(b)
}

/// Round `value` to the nearest multiple of `grid_size`.
///
/// A non-positive grid size leaves the value untouched.
#[must_use]
pub fn snap(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// [`snap`] when `enabled`, identity otherwise.
#[must_use]
pub fn snap_if(enabled: bool, value: f64, grid_size: f64) -> f64 {
    if enabled { snap(value, grid_size) } else { value }
}

/// Normalise an angle in degrees into `[0, 360)`. Display only; stored
/// rotations stay unbounded.
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r >= 360.0 { 0.0 } else { r }
}

/// Camera state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in screen pixels. `zoom` is the user-facing factor
/// (1.0 = 100%) and `scale` an internal multiplier; their product is the
/// effective zoom. `origin_x` / `origin_y` locate the canvas element's
/// top-left corner in the coordinate space of incoming pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0, scale: 1.0, origin_x: 0.0, origin_y: 0.0 }
    }
}

impl Camera {
    /// Zoom factor actually applied to canvas-to-screen conversion.
    #[must_use]
    pub fn effective_zoom(&self) -> f64 {
        self.zoom * self.scale
    }

    /// Convert a screen-space point to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        let z = self.effective_zoom();
        Point {
            x: (screen.x - self.origin_x - self.pan_x) / z,
            y: (screen.y - self.origin_y - self.pan_y) / z,
        }
    }

    /// Convert a canvas-space point to screen coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        let z = self.effective_zoom();
        Point {
            x: canvas.x * z + self.pan_x + self.origin_x,
            y: canvas.y * z + self.pan_y + self.origin_y,
        }
    }

    /// Convert a screen-space distance (pixels) to canvas units.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.effective_zoom()
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Set the zoom (clamped) while keeping the canvas point under `screen`
    /// fixed on screen.
    pub fn zoom_at(&mut self, screen: Point, new_zoom: f64) {
        let anchor = self.screen_to_canvas(screen);
        self.zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let z = self.effective_zoom();
        self.pan_x = screen.x - self.origin_x - anchor.x * z;
        self.pan_y = screen.y - self.origin_y - anchor.y * z;
    }
}
