//! Group transforms (translate, resize, rotate) applied to the selection.
//!
//! Every operation reads from a [`TransformSnapshot`] captured once at gesture
//! start and writes absolute geometry into the store. Calling one twice with
//! the same snapshot and pointer position gives identical output, so
//! pointer-move events never accumulate drift.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::camera::Point;
use crate::consts::MIN_EXTENT;
use crate::doc::{Element, ElementStore};
use crate::geometry::{self, Rect};
use crate::hit::ResizeAnchor;

/// Pre-transform copies of the selected elements plus their combined bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSnapshot {
    pub elements: Vec<Element>,
    pub bounds: Rect,
}

impl TransformSnapshot {
    /// Capture the current selection. Returns `None` when nothing is selected.
    #[must_use]
    pub fn capture(store: &ElementStore) -> Option<Self> {
        let elements: Vec<Element> = store.selected().cloned().collect();
        let bounds = geometry::group_bounds(&elements)?;
        Some(Self { elements, bounds })
    }
}

/// Write each transformed element's geometry back through the store.
fn commit(store: &mut ElementStore, updated: &[Element]) {
    for el in updated {
        store.set_geometry(&el.id, el);
    }
}

/// Offset every snapshot element by `(dx, dy)`.
pub fn translate(store: &mut ElementStore, snapshot: &TransformSnapshot, dx: f64, dy: f64) {
    let updated: Vec<Element> = snapshot
        .elements
        .iter()
        .map(|orig| {
            let mut el = orig.clone();
            el.translate(dx, dy);
            el
        })
        .collect();
    commit(store, &updated);
}

/// Drag the `anchor` handle from `start` to `current`, scaling the whole group
/// about the opposite handle.
pub fn resize(store: &mut ElementStore, snapshot: &TransformSnapshot, anchor: ResizeAnchor, start: Point, current: Point) {
    let b = snapshot.bounds;
    let dx = current.x - start.x;
    let dy = current.y - start.y;

    let mut left = b.x;
    let mut right = b.right();
    let mut top = b.y;
    let mut bottom = b.bottom();
    if anchor.moves_left() {
        left += dx;
    }
    if anchor.moves_right() {
        right += dx;
    }
    if anchor.moves_top() {
        top += dy;
    }
    if anchor.moves_bottom() {
        bottom += dy;
    }

    // Signed scale: dragging past the fixed edge mirrors the group.
    let (sx, x_map) = axis_map(b.x, b.width, left, right);
    let (sy, y_map) = axis_map(b.y, b.height, top, bottom);
    let map = |p: Point| Point::new(x_map(p.x), y_map(p.y));

    let updated: Vec<Element> = snapshot
        .elements
        .iter()
        .map(|orig| {
            let mut el = orig.clone();
            let theta = orig.angle;
            let c = orig.center();
            let moved = map(c);
            if el.has_point_geometry() {
                // Scale in world space, then return to the element's unrotated frame.
                el.map_points(|p| geometry::rotate_point(map(geometry::rotate_point(p, c, theta)), moved, -theta));
                el.normalize();
                keep_pivot(&mut el, moved);
            } else {
                let (sin, cos) = theta.sin_cos();
                let width = orig.width * (sx * cos).hypot(sy * sin);
                let height = orig.height * (sx * sin).hypot(sy * cos);
                el.x = moved.x - width / 2.0;
                el.y = moved.y - height / 2.0;
                el.width = width;
                el.height = height;
            }
            el
        })
        .collect();
    commit(store, &updated);
}

/// Linear map from the source span `[origin, origin + extent]` onto `[lo, hi]`,
/// returned with its signed scale. A degenerate source span leaves the axis untouched.
fn axis_map(origin: f64, extent: f64, lo: f64, hi: f64) -> (f64, impl Fn(f64) -> f64) {
    let (shift, scale) = if extent.abs() > MIN_EXTENT { (lo, (hi - lo) / extent) } else { (origin, 1.0) };
    (scale, move |v| shift + (v - origin) * scale)
}

/// Re-deriving the box from rotated sub-geometry moves its centre, and with it
/// the rotation pivot. Shift the points so they still render about `pivot`.
fn keep_pivot(el: &mut Element, pivot: Point) {
    if el.angle.abs() < f64::EPSILON {
        return;
    }
    let centre = el.center();
    let gap = Point::new(pivot.x - centre.x, pivot.y - centre.y);
    let turned = geometry::rotate_point(gap, Point::default(), el.angle);
    el.translate(gap.x - turned.x, gap.y - turned.y);
}

/// Rotate the group about its bounds centre by the angle swept from
/// `rotation_start` to `current`.
pub fn rotate(store: &mut ElementStore, snapshot: &TransformSnapshot, rotation_start: Point, current: Point) {
    let pivot = snapshot.bounds.center();
    let delta = sweep(pivot, rotation_start, current);
    let updated: Vec<Element> = snapshot
        .elements
        .iter()
        .map(|orig| {
            let mut el = orig.clone();
            let c = orig.center();
            let moved = geometry::rotate_point(c, pivot, delta);
            el.translate(moved.x - c.x, moved.y - c.y);
            el.angle = geometry::normalize_angle(orig.angle + delta);
            el
        })
        .collect();
    commit(store, &updated);
}

/// Signed angle swept about `pivot` going from `from` to `to`.
#[must_use]
pub fn sweep(pivot: Point, from: Point, to: Point) -> f64 {
    let a0 = (from.y - pivot.y).atan2(from.x - pivot.x);
    let a1 = (to.y - pivot.y).atan2(to.x - pivot.x);
    a1 - a0
}
