#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_SCALE};

/// A point in either screen or world space.
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

/// Pan/zoom transform for the infinite canvas.
///
/// `offset` is where the world origin sits on screen, in CSS pixels.
/// `scale` is the world-to-screen multiplier (1.0 = no zoom) and always
/// stays within `[MIN_SCALE, MAX_SCALE]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub offset: Point,
    scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { offset: Point::default(), scale: 1.0 }
    }
}

impl Viewport {
    /// Build a viewport, clamping `scale` into the legal range.
    #[must_use]
    pub fn new(offset: Point, scale: f64) -> Self {
        Self { offset, scale: clamp_scale(scale) }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Shift the world under the screen by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Change the scale by `delta`.
    ///
    /// With a pivot, the world point under the pivot stays under it after the
    /// zoom. Without one the world origin is the anchor and `offset` is left alone.
    pub fn zoom_by(&mut self, delta: f64, pivot: Option<Point>) {
        let next = clamp_scale(self.scale + delta);
        self.zoom_to(next, pivot);
    }

    /// Set the scale directly (clamped), anchored like [`Viewport::zoom_by`].
    pub fn set_scale(&mut self, scale: f64, pivot: Option<Point>) {
        self.zoom_to(clamp_scale(scale), pivot);
    }

    /// Back to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn zoom_to(&mut self, next: f64, pivot: Option<Point>) {
        if let Some(pivot) = pivot {
            let world = self.screen_to_world(pivot);
            self.offset.x = pivot.x - world.x * next;
            self.offset.y = pivot.y - world.y * next;
        }
        self.scale = next;
    }

    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset.x) / self.scale,
            y: (screen.y - self.offset.y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.offset.x,
            y: world.y * self.scale + self.offset.y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return MIN_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
