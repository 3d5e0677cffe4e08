//! Arrow-to-shape binding.
//!
//! While the arrow tool is active the engine tracks a hover candidate: the
//! shape under the pointer and the point on its silhouette nearest the
//! pointer. On commit each bound endpoint is snapped to that point, the side
//! and angle of attachment are recorded on a new [`Connection`], and the
//! arrow plus connection enter the scene in one call.
//!
//! Bindings are computed once. Moving, resizing, or rotating a bound shape
//! later does not recompute the side or angle, so an arrow can visually
//! detach from a reshaped host.

#[cfg(test)]
#[path = "binding_test.rs"]
mod binding_test;

use tracing::debug;

use crate::camera::Point;
use crate::doc::{
    ArrowDirection, Connection, ConnectionId, Element, ElementId, ElementKind, ElementStore, Scene, Shape, Side,
};
use crate::geometry;

/// A shape an arrow endpoint would bind to, with the snapped boundary point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorCandidate {
    pub element_id: ElementId,
    pub point: Point,
}

/// Side selected by the dominant axis of an offset from a shape's centre.
#[must_use]
pub fn side_for_offset(dx: f64, dy: f64) -> Side {
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Side::Right } else { Side::Left }
    } else if dy > 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

/// Whether an element can host an arrow endpoint.
fn can_host(el: &Element) -> bool {
    !el.is_deleted && !el.kind().is_linear() && el.kind() != ElementKind::SelectionOutline
}

/// The topmost bindable shape under `p` and its nearest boundary point.
#[must_use]
pub fn anchor_candidate(store: &ElementStore, p: Point, tolerance: f64) -> Option<AnchorCandidate> {
    store
        .live()
        .rev()
        .filter(|el| can_host(el))
        .find(|el| geometry::contains_point(el, p, tolerance))
        .map(|el| AnchorCandidate { element_id: el.id, point: geometry::closest_boundary_point(el, p) })
}

/// Side and bind angle of `point` relative to the host's centre.
fn attachment(host: &Element, point: Point) -> (Side, f64) {
    let c = host.center();
    let (dx, dy) = (point.x - c.x, point.y - c.y);
    (side_for_offset(dx, dy), dy.atan2(dx))
}

/// Finalize an arrow: snap bound endpoints, record sides, create its
/// connection, and commit both to `scene`.
///
/// A candidate whose element was deleted or removed since it was hovered is
/// treated as no candidate. A connection is created even when neither end binds.
pub fn bind_arrow(
    scene: &mut Scene,
    mut arrow: Element,
    start: Option<AnchorCandidate>,
    end: Option<AnchorCandidate>,
) -> ConnectionId {
    let mut connection = Connection::new(arrow.id);
    let live = |c: Option<AnchorCandidate>| {
        let c = c?;
        let host = scene.elements.by_id(&c.element_id).filter(|el| can_host(el))?;
        Some((c, attachment(host, c.point)))
    };
    let start = live(start);
    let end = live(end);

    if let Shape::Arrow { start_point, end_point, start_side, end_side, direction, .. } = &mut arrow.shape {
        if let Some((c, (side, angle))) = start {
            *start_point = c.point;
            *start_side = Some(side);
            connection.start_element_id = Some(c.element_id);
            connection.start_angle = Some(angle);
        }
        if let Some((c, (side, angle))) = end {
            *end_point = c.point;
            *end_side = Some(side);
            connection.end_element_id = Some(c.element_id);
            connection.end_angle = Some(angle);
        }
        *direction = ArrowDirection::between(*start_point, *end_point);
    }
    arrow.normalize();

    debug!(
        arrow = %arrow.id,
        start = ?connection.start_element_id,
        end = ?connection.end_element_id,
        "arrow bound"
    );
    let id = connection.id;
    scene.commit_arrow(arrow, connection);
    id
}
