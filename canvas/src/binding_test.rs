#![allow(clippy::float_cmp)]

use std::f64::consts::PI;

use super::*;
use crate::doc::Style;

fn make_rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    let mut el = Element::new(ElementKind::Rectangle, Point::new(x, y), Style::default());
    el.width = w;
    el.height = h;
    el
}

fn make_arrow(a: Point, b: Point) -> Element {
    let mut el = Element::new(ElementKind::Arrow, a, Style::default());
    if let Shape::Arrow { end_point, .. } = &mut el.shape {
        *end_point = b;
    }
    el.normalize();
    el
}

/// R1 centred at (50, 50), R2 centred at (150, 50).
fn two_rects() -> (Scene, ElementId, ElementId) {
    let mut scene = Scene::new();
    let r1 = make_rect(20.0, 20.0, 60.0, 60.0);
    let r2 = make_rect(120.0, 20.0, 60.0, 60.0);
    let ids = (r1.id, r2.id);
    scene.elements.upsert(r1);
    scene.elements.upsert(r2);
    (scene, ids.0, ids.1)
}

// =============================================================
// Sides
// =============================================================

#[test]
fn side_follows_dominant_axis() {
    assert_eq!(side_for_offset(10.0, 3.0), Side::Right);
    assert_eq!(side_for_offset(-10.0, 3.0), Side::Left);
    assert_eq!(side_for_offset(2.0, 9.0), Side::Bottom);
    assert_eq!(side_for_offset(2.0, -9.0), Side::Top);
}

#[test]
fn side_tie_goes_vertical() {
    assert_eq!(side_for_offset(5.0, 5.0), Side::Bottom);
    assert_eq!(side_for_offset(0.0, 0.0), Side::Top);
}

// =============================================================
// Candidates
// =============================================================

#[test]
fn candidate_snaps_to_boundary() {
    let (scene, r1, _) = two_rects();
    let c = anchor_candidate(&scene.elements, Point::new(70.0, 50.0), 0.0).unwrap();
    assert_eq!(c.element_id, r1);
    assert_eq!(c.point, Point::new(80.0, 50.0));
}

#[test]
fn candidate_is_none_over_empty_space() {
    let (scene, _, _) = two_rects();
    assert!(anchor_candidate(&scene.elements, Point::new(100.0, 50.0), 0.0).is_none());
}

#[test]
fn arrows_are_not_binding_hosts() {
    let mut scene = Scene::new();
    scene.elements.upsert(make_arrow(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    assert!(anchor_candidate(&scene.elements, Point::new(50.0, 0.0), 4.0).is_none());
}

// =============================================================
// bind_arrow
// =============================================================

#[test]
fn arrow_between_two_rectangles_binds_both_ends() {
    let (mut scene, r1, r2) = two_rects();
    let start = anchor_candidate(&scene.elements, Point::new(70.0, 50.0), 0.0);
    let end = anchor_candidate(&scene.elements, Point::new(130.0, 50.0), 0.0);
    let arrow = make_arrow(Point::new(70.0, 50.0), Point::new(130.0, 50.0));
    let arrow_id = arrow.id;

    let conn_id = bind_arrow(&mut scene, arrow, start, end);

    let conn = scene.connections.by_id(&conn_id).unwrap();
    assert_eq!(conn.start_element_id, Some(r1));
    assert_eq!(conn.end_element_id, Some(r2));
    assert_eq!(conn.start_angle, Some(0.0));
    assert_eq!(conn.end_angle, Some(PI));
    assert_eq!(scene.connections.len(), 1);

    let arrow = scene.elements.by_id(&arrow_id).unwrap();
    let Shape::Arrow { start_point, end_point, start_side, end_side, direction, connection_id } = &arrow.shape else {
        panic!("expected arrow");
    };
    assert_eq!(*start_side, Some(Side::Right));
    assert_eq!(*end_side, Some(Side::Left));
    assert_eq!(*start_point, Point::new(80.0, 50.0));
    assert_eq!(*end_point, Point::new(120.0, 50.0));
    assert_eq!(*direction, ArrowDirection::Right);
    assert_eq!(*connection_id, Some(conn_id));

    assert!(scene.elements.by_id(&r1).unwrap().connection_ids.contains(&conn_id));
    assert!(scene.elements.by_id(&r2).unwrap().connection_ids.contains(&conn_id));
    assert!(scene.check().is_empty());
}

#[test]
fn unbound_arrow_still_gets_a_connection() {
    let (mut scene, r1, _) = two_rects();
    let arrow = make_arrow(Point::new(300.0, 300.0), Point::new(400.0, 300.0));
    let conn_id = bind_arrow(&mut scene, arrow, None, None);
    let conn = scene.connections.by_id(&conn_id).unwrap();
    assert_eq!(conn.start_element_id, None);
    assert_eq!(conn.end_element_id, None);
    assert!(scene.elements.by_id(&r1).unwrap().connection_ids.is_empty());
    assert!(scene.check().is_empty());
}

#[test]
fn deleted_candidate_is_skipped() {
    let (mut scene, r1, r2) = two_rects();
    let start = anchor_candidate(&scene.elements, Point::new(70.0, 50.0), 0.0);
    let end = anchor_candidate(&scene.elements, Point::new(130.0, 50.0), 0.0);
    scene.soft_delete_element(&r2);
    let arrow = make_arrow(Point::new(70.0, 50.0), Point::new(130.0, 50.0));
    let arrow_id = arrow.id;

    let conn_id = bind_arrow(&mut scene, arrow, start, end);

    let conn = scene.connections.by_id(&conn_id).unwrap();
    assert_eq!(conn.start_element_id, Some(r1));
    assert_eq!(conn.end_element_id, None);
    let arrow = scene.elements.by_id(&arrow_id).unwrap();
    assert_eq!(arrow.endpoints().map(|(_, e)| e), Some(Point::new(130.0, 50.0)));
    assert!(scene.elements.by_id(&r2).unwrap().connection_ids.is_empty());
}

#[test]
fn vertical_binding_records_top_and_bottom() {
    let mut scene = Scene::new();
    let upper = make_rect(0.0, 0.0, 40.0, 40.0);
    let lower = make_rect(0.0, 100.0, 40.0, 40.0);
    scene.elements.upsert(upper);
    scene.elements.upsert(lower);
    let start = anchor_candidate(&scene.elements, Point::new(20.0, 35.0), 0.0);
    let end = anchor_candidate(&scene.elements, Point::new(20.0, 105.0), 0.0);
    let arrow = make_arrow(Point::new(20.0, 35.0), Point::new(20.0, 105.0));
    let arrow_id = arrow.id;
    bind_arrow(&mut scene, arrow, start, end);
    let Shape::Arrow { start_side, end_side, direction, .. } = scene.elements.by_id(&arrow_id).unwrap().shape else {
        panic!("expected arrow");
    };
    assert_eq!(start_side, Some(Side::Bottom));
    assert_eq!(end_side, Some(Side::Top));
    assert_eq!(direction, ArrowDirection::Down);
}
