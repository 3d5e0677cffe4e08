#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

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

    /// Offset this point by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Camera state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is the uniform scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor`, keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(screen);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan_x = screen.x - world.x * self.zoom;
        self.pan_y = screen.y - world.y * self.zoom;
    }
}
