#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{ElementId, ElementKind};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    SetTransform([f64; 6]),
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    Save,
    Restore,
    Clear(f64, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
    Rect(f64, f64, f64, f64),
    Ellipse(f64, f64, f64, f64),
    Arc(f64, f64, f64),
    Fill,
    Stroke,
    Clip,
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    LineDash(Vec<f64>),
    Alpha(f64),
    Font(String),
    FillText(String, f64, f64),
}

#[derive(Debug, Default)]
struct Recorder {
    ops: Vec<Op>,
    reject_text: bool,
}

impl Recorder {
    fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    fn has(&self, op: &Op) -> bool {
        self.ops.contains(op)
    }
}

impl Surface for Recorder {
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), RenderError> {
        self.ops.push(Op::SetTransform([a, b, c, d, e, f]));
        Ok(())
    }
    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ops.push(Op::Translate(x, y));
        Ok(())
    }
    fn rotate(&mut self, angle: f64) -> Result<(), RenderError> {
        self.ops.push(Op::Rotate(angle));
        Ok(())
    }
    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.ops.push(Op::Scale(x, y));
        Ok(())
    }
    fn save(&mut self) {
        self.ops.push(Op::Save);
    }
    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }
    fn clear(&mut self, width: f64, height: f64) {
        self.ops.push(Op::Clear(width, height));
    }
    fn begin_path(&mut self) {
        self.ops.push(Op::BeginPath);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(Op::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(Op::LineTo(x, y));
    }
    fn close_path(&mut self) {
        self.ops.push(Op::ClosePath);
    }
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(Op::Rect(x, y, width, height));
    }
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<(), RenderError> {
        self.ops.push(Op::Ellipse(cx, cy, rx, ry));
        Ok(())
    }
    fn arc(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), RenderError> {
        self.ops.push(Op::Arc(cx, cy, radius));
        Ok(())
    }
    fn fill(&mut self) {
        self.ops.push(Op::Fill);
    }
    fn stroke(&mut self) {
        self.ops.push(Op::Stroke);
    }
    fn clip(&mut self) {
        self.ops.push(Op::Clip);
    }
    fn set_fill_style(&mut self, color: &str) {
        self.ops.push(Op::FillStyle(color.to_owned()));
    }
    fn set_stroke_style(&mut self, color: &str) {
        self.ops.push(Op::StrokeStyle(color.to_owned()));
    }
    fn set_line_width(&mut self, width: f64) {
        self.ops.push(Op::LineWidth(width));
    }
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), RenderError> {
        self.ops.push(Op::LineDash(segments.to_vec()));
        Ok(())
    }
    fn set_alpha(&mut self, alpha: f64) {
        self.ops.push(Op::Alpha(alpha));
    }
    fn set_font(&mut self, font: &str) {
        self.ops.push(Op::Font(font.to_owned()));
    }
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        if self.reject_text {
            return Err(RenderError::Surface("text unsupported".to_owned()));
        }
        self.ops.push(Op::FillText(text.to_owned(), x, y));
        Ok(())
    }
}

fn make_shape(kind: ElementKind, x: f64, y: f64, w: f64, h: f64) -> Element {
    let mut el = Element::new(kind, Point::new(x, y), Style::default());
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

struct Fixture {
    scene: Scene,
    camera: Camera,
    config: CanvasConfig,
    peers: Vec<PeerState>,
}

impl Fixture {
    fn new() -> Self {
        Self { scene: Scene::new(), camera: Camera::default(), config: CanvasConfig::default(), peers: Vec::new() }
    }

    fn add(&mut self, el: Element) -> ElementId {
        let id = el.id;
        self.scene.elements.upsert(el);
        id
    }

    fn view(&self) -> FrameView<'_> {
        FrameView {
            scene: &self.scene,
            camera: &self.camera,
            config: &self.config,
            in_progress: None,
            marquee: None,
            hover: None,
            anchors: [None, None],
            peers: &self.peers,
            viewport_width: 800.0,
            viewport_height: 600.0,
            dpr: 1.0,
        }
    }

    fn render(&self, view: &FrameView<'_>) -> Recorder {
        let mut rec = Recorder::default();
        draw(&mut rec, view).unwrap();
        rec
    }
}

// =============================================================
// Frame setup
// =============================================================

#[test]
fn frame_starts_with_clear_and_camera_transform() {
    let mut fx = Fixture::new();
    fx.camera = Camera { pan_x: 10.0, pan_y: 20.0, zoom: 2.0 };
    let mut view = fx.view();
    view.dpr = 2.0;
    let rec = fx.render(&view);
    assert_eq!(
        rec.ops[..4],
        [
            Op::SetTransform([2.0, 0.0, 0.0, 2.0, 0.0, 0.0]),
            Op::Clear(800.0, 600.0),
            Op::Translate(10.0, 20.0),
            Op::Scale(2.0, 2.0),
        ]
    );
}

#[test]
fn empty_scene_draws_nothing_else() {
    let fx = Fixture::new();
    let rec = fx.render(&fx.view());
    assert_eq!(rec.ops.len(), 4);
}

// =============================================================
// Elements
// =============================================================

#[test]
fn deleted_and_marked_elements_are_skipped() {
    let mut fx = Fixture::new();
    fx.add(make_shape(ElementKind::Ellipse, 0.0, 0.0, 20.0, 20.0));
    let deleted = fx.add(make_shape(ElementKind::Ellipse, 100.0, 0.0, 20.0, 20.0));
    let marked = fx.add(make_shape(ElementKind::Ellipse, 200.0, 0.0, 20.0, 20.0));
    fx.scene.elements.soft_delete(&deleted);
    fx.scene.elements.mark_for_deletion(&marked);

    let rec = fx.render(&fx.view());
    let ellipses: Vec<&Op> = rec.ops.iter().filter(|op| matches!(op, Op::Ellipse(..))).collect();
    assert_eq!(ellipses, vec![&Op::Ellipse(10.0, 10.0, 10.0, 10.0)]);
}

#[test]
fn transparent_background_is_not_filled() {
    let mut fx = Fixture::new();
    fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    let rec = fx.render(&fx.view());
    assert_eq!(rec.count(|op| *op == Op::Fill), 0);
    assert_eq!(rec.count(|op| *op == Op::Stroke), 1);
}

#[test]
fn solid_background_is_filled() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Diamond, 0.0, 0.0, 50.0, 50.0);
    el.style.background_color = "#ff0000".to_owned();
    fx.add(el);
    let rec = fx.render(&fx.view());
    assert!(rec.has(&Op::FillStyle("#ff0000".to_owned())));
    assert_eq!(rec.count(|op| *op == Op::Fill), 1);
    // Diamond outline starts at the top vertex.
    assert!(rec.has(&Op::MoveTo(25.0, 0.0)));
}

#[test]
fn hachure_fill_clips_to_outline() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Rectangle, 0.0, 0.0, 40.0, 40.0);
    el.style.background_color = "#00ff00".to_owned();
    el.style.fill_style = FillStyle::Hachure;
    fx.add(el);
    let rec = fx.render(&fx.view());
    assert_eq!(rec.count(|op| *op == Op::Clip), 1);
    assert_eq!(rec.count(|op| *op == Op::Fill), 0);
    assert!(rec.has(&Op::StrokeStyle("#00ff00".to_owned())));
}

#[test]
fn rotated_element_rotates_about_its_center() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Rectangle, 0.0, 0.0, 100.0, 50.0);
    el.angle = 0.5;
    fx.add(el);
    let rec = fx.render(&fx.view());
    let at = rec.ops.iter().position(|op| *op == Op::Rotate(0.5)).unwrap();
    assert_eq!(rec.ops[at - 1], Op::Translate(50.0, 25.0));
    assert_eq!(rec.ops[at + 1], Op::Translate(-50.0, -25.0));
}

#[test]
fn negligible_angle_skips_rotation() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Rectangle, 0.0, 0.0, 100.0, 50.0);
    el.angle = 1e-18;
    fx.add(el);
    let rec = fx.render(&fx.view());
    assert!(!rec.ops.iter().any(|op| matches!(op, Op::Rotate(_))));
}

#[test]
fn arrow_draws_filled_head_at_end_point() {
    let mut fx = Fixture::new();
    fx.add(make_arrow(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    let rec = fx.render(&fx.view());
    let head = rec.ops.iter().position(|op| *op == Op::MoveTo(100.0, 0.0)).unwrap();
    assert!(matches!(rec.ops[head + 1], Op::LineTo(x, _) if x < 100.0));
    assert!(matches!(rec.ops[head + 2], Op::LineTo(x, _) if x < 100.0));
    assert_eq!(rec.ops[head + 3], Op::ClosePath);
    assert_eq!(rec.ops[head + 4], Op::Fill);
}

#[test]
fn text_is_drawn_line_by_line() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Text, 10.0, 10.0, 200.0, 24.0);
    el.text = "one\ntwo".to_owned();
    fx.add(el);
    let rec = fx.render(&fx.view());
    assert!(rec.has(&Op::FillText("one".to_owned(), 10.0, 26.0)));
    assert!(rec.has(&Op::FillText("two".to_owned(), 10.0, 42.0)));
    // Text boxes have no border.
    assert_eq!(rec.count(|op| *op == Op::Stroke), 0);
}

// =============================================================
// Selection and marquee
// =============================================================

fn is_rect(op: &Op) -> bool {
    matches!(op, Op::Rect(..))
}

#[test]
fn single_selection_draws_box_and_handles() {
    let mut fx = Fixture::new();
    let id = fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    fx.scene.elements.set_selected(&id, true);
    let rec = fx.render(&fx.view());
    // One dashed box plus eight resize handles.
    assert_eq!(rec.count(is_rect), 9);
    assert!(rec.has(&Op::LineDash(vec![4.0, 4.0])));
    assert!(rec.has(&Op::StrokeStyle(SELECTION_COLOR.to_owned())));
    // Rotate handle sits above the top edge.
    assert!(rec.has(&Op::Arc(25.0, -24.0, 4.0)));
}

#[test]
fn multi_selection_adds_group_outline() {
    let mut fx = Fixture::new();
    let a = fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    let b = fx.add(make_shape(ElementKind::Rectangle, 100.0, 100.0, 50.0, 50.0));
    fx.scene.elements.select_only(&[a, b]);
    let rec = fx.render(&fx.view());
    assert_eq!(rec.count(is_rect), 2 + 1 + 8);
    assert!(rec.has(&Op::Rect(0.0, 0.0, 150.0, 150.0)));
}

#[test]
fn selection_hidden_while_drawing() {
    let mut fx = Fixture::new();
    let id = fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    fx.scene.elements.set_selected(&id, true);
    let drawing = make_shape(ElementKind::Ellipse, 200.0, 200.0, 10.0, 10.0);
    let mut view = fx.view();
    view.in_progress = Some(&drawing);
    let rec = fx.render(&view);
    assert_eq!(rec.count(is_rect), 0);
    assert!(rec.has(&Op::Ellipse(205.0, 205.0, 5.0, 5.0)));
}

#[test]
fn marquee_uses_translucent_fill() {
    let fx = Fixture::new();
    let mut view = fx.view();
    view.marquee = Some(Rect::new(5.0, 5.0, 30.0, 40.0));
    let rec = fx.render(&view);
    assert!(rec.has(&Op::FillStyle("rgba(30, 144, 255, 0.12)".to_owned())));
    assert!(rec.has(&Op::Rect(5.0, 5.0, 30.0, 40.0)));
}

#[test]
fn dash_and_handles_scale_with_zoom() {
    let mut fx = Fixture::new();
    fx.camera.zoom = 2.0;
    let id = fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    fx.scene.elements.set_selected(&id, true);
    let rec = fx.render(&fx.view());
    assert!(rec.has(&Op::LineDash(vec![2.0, 2.0])));
    // Handle squares are 8px on screen, 4 world units at 2x.
    assert!(rec.has(&Op::Rect(-2.0, -2.0, 4.0, 4.0)));
}

// =============================================================
// Hover and peers
// =============================================================

#[test]
fn hover_highlights_target_and_marks_anchors() {
    let mut fx = Fixture::new();
    fx.camera.zoom = 2.0;
    let id = fx.add(make_shape(ElementKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
    let anchor = Point::new(50.0, 25.0);
    let mut view = fx.view();
    view.hover = Some(AnchorCandidate { element_id: id, point: anchor });
    view.anchors = [Some(anchor), None];
    let rec = fx.render(&view);
    assert!(rec.has(&Op::StrokeStyle(HOVER_COLOR.to_owned())));
    assert!(rec.has(&Op::Arc(50.0, 25.0, 2.5)));
    // Element drawn once normally, once highlighted.
    assert_eq!(rec.count(|op| *op == Op::Stroke), 2);
}

#[test]
fn peers_draw_cursor_label_and_faded_hint() {
    let mut fx = Fixture::new();
    fx.peers.push(PeerState {
        peer_id: "p1".to_owned(),
        peer_name: "Ada".to_owned(),
        peer_color: "#ff8800".to_owned(),
        cursor_position: Point::new(30.0, 40.0),
        drawing_hint: Some(make_shape(ElementKind::Ellipse, 0.0, 0.0, 10.0, 10.0)),
    });
    let rec = fx.render(&fx.view());
    assert!(rec.has(&Op::Alpha(PEER_HINT_ALPHA)));
    assert!(rec.has(&Op::StrokeStyle("#ff8800".to_owned())));
    assert!(rec.has(&Op::Arc(30.0, 40.0, 5.0)));
    assert!(rec.has(&Op::FillText("Ada".to_owned(), 38.0, 56.0)));
}

// =============================================================
// Errors
// =============================================================

#[test]
fn surface_errors_propagate() {
    let mut fx = Fixture::new();
    let mut el = make_shape(ElementKind::Text, 0.0, 0.0, 200.0, 24.0);
    el.text = "hello".to_owned();
    fx.add(el);
    let mut rec = Recorder { reject_text: true, ..Recorder::default() };
    let err = draw(&mut rec, &fx.view()).unwrap_err();
    assert!(matches!(err, RenderError::Surface(msg) if msg == "text unsupported"));
}
