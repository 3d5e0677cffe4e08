//! Pure geometry over scene elements.
//!
//! Every element stores its silhouette unrotated, inside its `(x, y, width,
//! height)` box, and `angle` rotates that silhouette about the box centre.
//! The helpers here move points between world space and that local frame so
//! containment and boundary snapping can be computed on the unrotated shape.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::{MIN_EXTENT, RHOMBUS_SKEW_RATIO};
use crate::doc::{Element, Shape};

/// Axis-aligned rectangle in world coordinates.
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

    /// Normalized rectangle spanning two opposite corners, in either order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Min/max envelope of `points`, or `None` when there are no points.
    pub fn envelope(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self { x: min_x, y: min_y, width: max_x - min_x, height: max_y - min_y })
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

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
    }

    /// Corners clockwise from the top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

/// Local (unrotated) silhouette of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    /// Closed polygon.
    Polygon(Vec<Point>),
    /// Axis-aligned ellipse.
    Ellipse { center: Point, rx: f64, ry: f64 },
    /// Open stroke through the given points.
    Polyline(Vec<Point>),
}

/// Wrap an angle into `[0, 2π)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Rotate `p` about `center` by `angle` radians (clockwise in screen space).
#[must_use]
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    if angle.abs() < f64::EPSILON {
        return p;
    }
    let (sin, cos) = angle.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// The element's four box corners rotated about its centre by `angle`.
#[must_use]
pub fn rotated_corners(el: &Element) -> [Point; 4] {
    let center = el.center();
    el.bounds().corners().map(|c| rotate_point(c, center, el.angle))
}

/// Axis-aligned envelope of the element's rotated corners.
#[must_use]
pub fn rotated_bounds(el: &Element) -> Rect {
    let [a, b, c, d] = rotated_corners(el);
    Rect::envelope([a, b, c, d]).unwrap_or_else(|| el.bounds())
}

/// Combined rotated bounds of a group of elements.
pub fn group_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Rect> {
    Rect::envelope(elements.into_iter().flat_map(rotated_corners))
}

/// The element's silhouette in its local (unrotated) frame.
#[must_use]
pub fn outline(el: &Element) -> Outline {
    let b = el.bounds();
    match &el.shape {
        Shape::Rectangle | Shape::Text | Shape::SelectionOutline => Outline::Polygon(b.corners().to_vec()),
        Shape::Diamond => {
            let c = b.center();
            Outline::Polygon(vec![
                Point::new(c.x, b.y),
                Point::new(b.right(), c.y),
                Point::new(c.x, b.bottom()),
                Point::new(b.x, c.y),
            ])
        }
        Shape::Rhombus => {
            let skew = b.width * RHOMBUS_SKEW_RATIO;
            Outline::Polygon(vec![
                Point::new(b.x + skew, b.y),
                Point::new(b.right(), b.y),
                Point::new(b.right() - skew, b.bottom()),
                Point::new(b.x, b.bottom()),
            ])
        }
        Shape::Ellipse => Outline::Ellipse { center: b.center(), rx: b.width / 2.0, ry: b.height / 2.0 },
        Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. } => {
            Outline::Polyline(vec![*start_point, *end_point])
        }
        Shape::Freedraw { points } => Outline::Polyline(points.clone()),
    }
}

/// Whether `p` lies on or inside the element's rotated silhouette.
///
/// `tolerance` widens the boundary, which is what makes zero-area strokes
/// (lines, arrows, freedraw) hittable at all.
#[must_use]
pub fn contains_point(el: &Element, p: Point, tolerance: f64) -> bool {
    let local = rotate_point(p, el.center(), -el.angle);
    match outline(el) {
        Outline::Polygon(poly) => {
            point_in_polygon(&poly, local) || distance_to_polyline(&poly, true, local) <= tolerance
        }
        Outline::Ellipse { center, rx, ry } => {
            let rx = rx + tolerance;
            let ry = ry + tolerance;
            if rx <= MIN_EXTENT || ry <= MIN_EXTENT {
                return local.distance(center) <= tolerance;
            }
            let nx = (local.x - center.x) / rx;
            let ny = (local.y - center.y) / ry;
            nx * nx + ny * ny <= 1.0
        }
        Outline::Polyline(points) => distance_to_polyline(&points, false, local) <= tolerance,
    }
}

/// The point on the element's rotated boundary nearest to `p`.
///
/// For ellipses this is the radial projection from the centre, which is what
/// arrow snapping needs and avoids an iterative solve.
#[must_use]
pub fn closest_boundary_point(el: &Element, p: Point) -> Point {
    let center = el.center();
    let local = rotate_point(p, center, -el.angle);
    let snapped = match outline(el) {
        Outline::Polygon(poly) => closest_point_on_polyline(&poly, true, local),
        Outline::Ellipse { center: c, rx, ry } => {
            if rx <= MIN_EXTENT || ry <= MIN_EXTENT {
                closest_point_on_polyline(&el.bounds().corners(), true, local)
            } else {
                let dx = local.x - c.x;
                let dy = local.y - c.y;
                let norm = ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt();
                if norm <= MIN_EXTENT {
                    Point::new(c.x, c.y - ry)
                } else {
                    Point::new(c.x + dx / norm, c.y + dy / norm)
                }
            }
        }
        Outline::Polyline(points) => closest_point_on_polyline(&points, false, local),
    };
    rotate_point(snapped, center, el.angle)
}

/// Even-odd ray-cast containment for a closed polygon.
#[must_use]
pub fn point_in_polygon(poly: &[Point], p: Point) -> bool {
    let mut inside = false;
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Closest point to `p` on segment `a`–`b`.
#[must_use]
pub fn closest_point_on_segment(a: Point, b: Point, p: Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= MIN_EXTENT * MIN_EXTENT {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * dx, a.y + t * dy)
}

fn closest_point_on_polyline(points: &[Point], closed: bool, p: Point) -> Point {
    let Some(&first) = points.first() else {
        return p;
    };
    let mut best = first;
    let mut best_dist = f64::INFINITY;
    for (a, b) in segments(points, closed) {
        let candidate = closest_point_on_segment(a, b, p);
        let d = candidate.distance(p);
        if d < best_dist {
            best = candidate;
            best_dist = d;
        }
    }
    best
}

fn distance_to_polyline(points: &[Point], closed: bool, p: Point) -> f64 {
    if points.is_empty() {
        return f64::INFINITY;
    }
    closest_point_on_polyline(points, closed, p).distance(p)
}

/// Consecutive point pairs; a single point yields one zero-length segment.
fn segments(points: &[Point], closed: bool) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = points.len();
    let count = match n {
        0 => 0,
        1 => 1,
        _ if closed => n,
        _ => n - 1,
    };
    (0..count).map(move |i| (points[i], points[(i + 1) % n]))
}
