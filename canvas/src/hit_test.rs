use super::*;
use crate::doc::{ElementKind, Style};

fn make_rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    let mut el = Element::new(ElementKind::Rectangle, Point::new(x, y), Style::default());
    el.width = w;
    el.height = h;
    el
}

fn store_with(elements: Vec<Element>) -> ElementStore {
    let mut store = ElementStore::new();
    for el in elements {
        store.upsert(el);
    }
    store
}

fn bounds() -> Rect {
    Rect::new(100.0, 100.0, 200.0, 100.0)
}

// =============================================================
// ResizeAnchor
// =============================================================

#[test]
fn anchor_positions_on_bounds() {
    let b = bounds();
    assert_eq!(ResizeAnchor::Nw.position(&b), Point::new(100.0, 100.0));
    assert_eq!(ResizeAnchor::N.position(&b), Point::new(200.0, 100.0));
    assert_eq!(ResizeAnchor::E.position(&b), Point::new(300.0, 150.0));
    assert_eq!(ResizeAnchor::Se.position(&b), Point::new(300.0, 200.0));
}

#[test]
fn anchor_edges_are_exclusive_per_axis() {
    for anchor in ResizeAnchor::ALL {
        assert!(!(anchor.moves_left() && anchor.moves_right()));
        assert!(!(anchor.moves_top() && anchor.moves_bottom()));
    }
    assert!(ResizeAnchor::N.moves_top());
    assert!(!ResizeAnchor::N.moves_left());
    assert!(!ResizeAnchor::N.moves_right());
}

#[test]
fn anchor_cursors() {
    assert_eq!(ResizeAnchor::Nw.cursor(), "nwse-resize");
    assert_eq!(ResizeAnchor::Sw.cursor(), "nesw-resize");
    assert_eq!(ResizeAnchor::S.cursor(), "ns-resize");
    assert_eq!(ResizeAnchor::W.cursor(), "ew-resize");
}

// =============================================================
// Handles
// =============================================================

#[test]
fn resize_handle_hit_within_radius() {
    let cfg = CanvasConfig::default();
    let cam = Camera::default();
    assert_eq!(resize_handle_at(Point::new(305.0, 195.0), &bounds(), &cam, &cfg), Some(ResizeAnchor::Se));
    assert_eq!(resize_handle_at(Point::new(200.0, 98.0), &bounds(), &cam, &cfg), Some(ResizeAnchor::N));
    assert_eq!(resize_handle_at(Point::new(200.0, 150.0), &bounds(), &cam, &cfg), None);
}

#[test]
fn resize_handle_radius_shrinks_with_zoom() {
    let cfg = CanvasConfig::default();
    let cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 4.0 };
    // 8 screen px at 4x zoom is 2 world units.
    assert_eq!(resize_handle_at(Point::new(305.0, 200.0), &bounds(), &cam, &cfg), None);
    assert_eq!(resize_handle_at(Point::new(301.5, 200.0), &bounds(), &cam, &cfg), Some(ResizeAnchor::Se));
}

#[test]
fn rotate_handle_sits_above_top_edge() {
    let cfg = CanvasConfig::default();
    let cam = Camera::default();
    assert_eq!(rotate_handle_position(&bounds(), &cam, &cfg), Point::new(200.0, 76.0));
    assert!(rotate_handle_at(Point::new(203.0, 78.0), &bounds(), &cam, &cfg));
    assert!(!rotate_handle_at(Point::new(200.0, 100.0), &bounds(), &cam, &cfg));
}

// =============================================================
// Elements
// =============================================================

#[test]
fn topmost_prefers_last_inserted() {
    let a = make_rect(0.0, 0.0, 50.0, 50.0);
    let b = make_rect(25.0, 25.0, 50.0, 50.0);
    let b_id = b.id;
    let store = store_with(vec![a, b]);
    assert_eq!(topmost_element_at(&store, Point::new(30.0, 30.0), 0.0).map(|e| e.id), Some(b_id));
}

#[test]
fn topmost_skips_deleted() {
    let a = make_rect(0.0, 0.0, 50.0, 50.0);
    let b = make_rect(0.0, 0.0, 50.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut store = store_with(vec![a, b]);
    store.soft_delete(&b_id);
    assert_eq!(topmost_element_at(&store, Point::new(10.0, 10.0), 0.0).map(|e| e.id), Some(a_id));
}

#[test]
fn empty_scene_hits_nothing() {
    let store = ElementStore::new();
    assert!(hit_test(Point::new(0.0, 0.0), &store, &Camera::default(), &CanvasConfig::default()).is_none());
}

#[test]
fn rotated_element_hit_uses_rotation() {
    let mut el = make_rect(0.0, 0.0, 100.0, 10.0);
    el.angle = std::f64::consts::FRAC_PI_2;
    let store = store_with(vec![el]);
    assert!(topmost_element_at(&store, Point::new(50.0, 40.0), 0.0).is_some());
    assert!(topmost_element_at(&store, Point::new(90.0, 5.0), 0.0).is_none());
}

#[test]
fn hit_test_prefers_handles_of_selection() {
    let el = make_rect(100.0, 100.0, 200.0, 100.0);
    let id = el.id;
    let mut store = store_with(vec![el]);
    let cam = Camera::default();
    let cfg = CanvasConfig::default();
    assert_eq!(
        hit_test(Point::new(100.0, 100.0), &store, &cam, &cfg),
        Some(Hit { element_id: Some(id), part: HitPart::Body })
    );
    store.set_selected(&id, true);
    assert_eq!(
        hit_test(Point::new(100.0, 100.0), &store, &cam, &cfg),
        Some(Hit { element_id: None, part: HitPart::ResizeHandle(ResizeAnchor::Nw) })
    );
    assert_eq!(
        hit_test(Point::new(200.0, 76.0), &store, &cam, &cfg),
        Some(Hit { element_id: None, part: HitPart::RotateHandle })
    );
}

#[test]
fn selection_bounds_spans_selected_only() {
    let a = make_rect(0.0, 0.0, 10.0, 10.0);
    let b = make_rect(50.0, 50.0, 10.0, 10.0);
    let c = make_rect(500.0, 500.0, 10.0, 10.0);
    let ids = [a.id, b.id];
    let mut store = store_with(vec![a, b, c]);
    assert!(selection_bounds(&store).is_none());
    store.select_only(&ids);
    assert_eq!(selection_bounds(&store), Some(Rect::new(0.0, 0.0, 60.0, 60.0)));
}
