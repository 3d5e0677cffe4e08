//! Hit-testing: selection handles first, then element bodies in reverse z-order.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::config::CanvasConfig;
use crate::doc::{Element, ElementId, ElementStore};
use crate::geometry::{self, Rect};

/// Which part of the scene was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
}

/// Anchor position for resize handles.
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
    /// Corners first, so a corner wins where it overlaps an edge hot-zone.
    pub const ALL: [Self; 8] = [Self::Nw, Self::Ne, Self::Se, Self::Sw, Self::N, Self::E, Self::S, Self::W];

    /// Handle centre on `bounds`.
    #[must_use]
    pub fn position(self, bounds: &Rect) -> Point {
        let c = bounds.center();
        match self {
            Self::N => Point::new(c.x, bounds.y),
            Self::Ne => Point::new(bounds.right(), bounds.y),
            Self::E => Point::new(bounds.right(), c.y),
            Self::Se => Point::new(bounds.right(), bounds.bottom()),
            Self::S => Point::new(c.x, bounds.bottom()),
            Self::Sw => Point::new(bounds.x, bounds.bottom()),
            Self::W => Point::new(bounds.x, c.y),
            Self::Nw => Point::new(bounds.x, bounds.y),
        }
    }

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// CSS cursor shown while hovering this handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Nw | Self::Se => "nwse-resize",
            Self::Ne | Self::Sw => "nesw-resize",
            Self::N | Self::S => "ns-resize",
            Self::E | Self::W => "ew-resize",
        }
    }
}

/// Result of a hit test. Handle hits belong to the whole selection and carry no element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub element_id: Option<ElementId>,
    pub part: HitPart,
}

/// Combined rotated bounds of every selected, non-deleted element.
#[must_use]
pub fn selection_bounds(store: &ElementStore) -> Option<Rect> {
    geometry::group_bounds(store.selected())
}

/// World-space centre of the rotate handle above `bounds`.
#[must_use]
pub fn rotate_handle_position(bounds: &Rect, camera: &Camera, config: &CanvasConfig) -> Point {
    let offset = camera.screen_dist_to_world(config.rotate_handle_offset_px);
    Point::new(bounds.center().x, bounds.y - offset)
}

/// The resize handle whose hot-zone contains `p`, if any.
#[must_use]
pub fn resize_handle_at(p: Point, bounds: &Rect, camera: &Camera, config: &CanvasConfig) -> Option<ResizeAnchor> {
    let r = camera.screen_dist_to_world(config.handle_radius_px);
    ResizeAnchor::ALL.into_iter().find(|anchor| {
        let h = anchor.position(bounds);
        (p.x - h.x).abs() <= r && (p.y - h.y).abs() <= r
    })
}

/// Whether `p` is on the rotate handle above `bounds`.
#[must_use]
pub fn rotate_handle_at(p: Point, bounds: &Rect, camera: &Camera, config: &CanvasConfig) -> bool {
    let r = camera.screen_dist_to_world(config.handle_radius_px);
    p.distance(rotate_handle_position(bounds, camera, config)) <= r
}

/// The last-drawn live element whose rotated silhouette contains `p`.
#[must_use]
pub fn topmost_element_at<'a>(store: &'a ElementStore, p: Point, tolerance: f64) -> Option<&'a Element> {
    store.live().rev().find(|el| geometry::contains_point(el, p, tolerance))
}

/// Test what is under `p`: the selection's rotate handle, then its resize
/// handles, then element bodies.
#[must_use]
pub fn hit_test(p: Point, store: &ElementStore, camera: &Camera, config: &CanvasConfig) -> Option<Hit> {
    if let Some(bounds) = selection_bounds(store) {
        if rotate_handle_at(p, &bounds, camera, config) {
            return Some(Hit { element_id: None, part: HitPart::RotateHandle });
        }
        if let Some(anchor) = resize_handle_at(p, &bounds, camera, config) {
            return Some(Hit { element_id: None, part: HitPart::ResizeHandle(anchor) });
        }
    }
    let tolerance = camera.screen_dist_to_world(config.hit_tolerance_px);
    topmost_element_at(store, p, tolerance).map(|el| Hit { element_id: Some(el.id), part: HitPart::Body })
}
