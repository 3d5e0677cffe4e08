//! Rendering: draws the full canvas scene to a 2D surface.
//!
//! Drawing goes through the [`Surface`] trait, implemented here for
//! [`web_sys::CanvasRenderingContext2d`]. The renderer receives a read-only
//! [`FrameView`] and produces pixels; it never mutates application state.
//!
//! Fallible surface calls propagate as [`RenderError`]. The top-level caller
//! ([`crate::engine::Engine::render`]) logs and drops the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::{PI, TAU};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::binding::AnchorCandidate;
use crate::camera::{Camera, Point};
use crate::config::CanvasConfig;
use crate::doc::{Element, FillStyle, Scene, Shape, Style};
use crate::geometry::{self, Outline, Rect};
use crate::hit::{self, ResizeAnchor};
use crate::presence::PeerState;

/// Arrowhead length in world units.
const ARROW_SIZE: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Hover anchor dot radius in screen pixels.
const ANCHOR_DOT_PX: f64 = 5.0;

/// Spacing between hachure strokes in world units.
const HACHURE_GAP: f64 = 8.0;

/// Opacity applied to a peer's in-progress drawing.
const PEER_HINT_ALPHA: f64 = 0.4;

const SELECTION_COLOR: &str = "#1E90FF";
const HOVER_COLOR: &str = "#6965db";
const TEXT_FONT_PX: f64 = 16.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface call failed: {0}")]
    Surface(String),
}

impl From<JsValue> for RenderError {
    fn from(value: JsValue) -> Self {
        Self::Surface(format!("{value:?}"))
    }
}

/// The 2D drawing primitives the renderer needs.
pub trait Surface {
    /// Replace the current transform with the affine matrix `[a b c d e f]`.
    ///
    /// # Errors
    ///
    /// Fallible primitives return [`RenderError::Surface`] when the backend rejects the call.
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), RenderError>;
    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError>;
    fn rotate(&mut self, angle: f64) -> Result<(), RenderError>;
    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError>;
    fn save(&mut self);
    fn restore(&mut self);
    /// Clear `width × height` at the surface origin.
    fn clear(&mut self, width: f64, height: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<(), RenderError>;
    fn arc(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), RenderError>;
    fn fill(&mut self);
    fn stroke(&mut self);
    fn clip(&mut self);

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), RenderError>;
    fn set_alpha(&mut self, alpha: f64);
    fn set_font(&mut self, font: &str);
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;
}

impl Surface for CanvasRenderingContext2d {
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::set_transform(self, a, b, c, d, e, f)?)
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::translate(self, x, y)?)
    }

    fn rotate(&mut self, angle: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::rotate(self, angle)?)
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::scale(self, x, y)?)
    }

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.clear_rect(0.0, 0.0, width, height);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        CanvasRenderingContext2d::rect(self, x, y, width, height);
    }

    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::ellipse(self, cx, cy, rx, ry, 0.0, 0.0, TAU)?)
    }

    fn arc(&mut self, cx: f64, cy: f64, radius: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::arc(self, cx, cy, radius, 0.0, TAU)?)
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn clip(&mut self) {
        CanvasRenderingContext2d::clip(self);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.set_fill_style_str(color);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), RenderError> {
        let dash_array = js_sys::Array::new();
        for s in segments {
            dash_array.push(&(*s).into());
        }
        Ok(CanvasRenderingContext2d::set_line_dash(self, &dash_array)?)
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.set_global_alpha(alpha);
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        Ok(CanvasRenderingContext2d::fill_text(self, text, x, y)?)
    }
}

/// Everything one frame draws, borrowed from the engine.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub config: &'a CanvasConfig,
    /// Element being drawn, not yet in the scene.
    pub in_progress: Option<&'a Element>,
    /// World-space marquee box.
    pub marquee: Option<Rect>,
    /// Hover highlight target.
    pub hover: Option<AnchorCandidate>,
    /// Snapped arrow anchors to mark with dots.
    pub anchors: [Option<Point>; 2],
    pub peers: &'a [PeerState],
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any surface call fails.
pub fn draw<S: Surface + ?Sized>(s: &mut S, view: &FrameView<'_>) -> Result<(), RenderError> {
    let camera = view.camera;
    let zoom = camera.zoom;

    // Layer 1: clear and set up the camera transform.
    s.set_transform(view.dpr, 0.0, 0.0, view.dpr, 0.0, 0.0)?;
    s.clear(view.viewport_width, view.viewport_height);
    s.translate(camera.pan_x, camera.pan_y)?;
    s.scale(zoom, zoom)?;

    // Layer 2: committed elements in z-order.
    for el in view.scene.elements.live().filter(|el| !el.is_marked_for_deletion) {
        draw_element(s, el, None)?;
    }

    // Layer 3: the element being drawn.
    if let Some(el) = view.in_progress {
        draw_element(s, el, None)?;
    }

    // Layer 4: selection chrome, hidden while drawing.
    if view.in_progress.is_none() {
        draw_selection(s, view)?;
    }

    if let Some(m) = view.marquee {
        draw_marquee(s, m, zoom)?;
    }

    // Layer 5: bind candidate highlight and snapped anchors.
    if let Some(hover) = view.hover {
        if let Some(el) = view.scene.elements.by_id(&hover.element_id).filter(|el| !el.is_deleted) {
            draw_element(s, el, Some(HOVER_COLOR))?;
        }
    }
    for p in view.anchors.iter().flatten() {
        draw_dot(s, *p, ANCHOR_DOT_PX / zoom, HOVER_COLOR)?;
    }

    // Layer 6: peers.
    for peer in view.peers {
        draw_peer(s, peer, zoom)?;
    }
    Ok(())
}

// =============================================================
// Element dispatch
// =============================================================

/// Draw one element; `stroke_override` replaces the stroke color (hover).
fn draw_element<S: Surface + ?Sized>(s: &mut S, el: &Element, stroke_override: Option<&str>) -> Result<(), RenderError> {
    s.save();
    s.set_alpha(el.style.opacity.clamp(0.0, 1.0));
    rotate_about_center(s, el)?;

    let outline = geometry::outline(el);
    trace_outline(s, &outline)?;
    let closed = !matches!(outline, Outline::Polyline(_));
    if closed && paints_fill(&el.style) {
        match el.style.fill_style {
            FillStyle::Solid => {
                s.set_fill_style(&el.style.background_color);
                s.fill();
            }
            FillStyle::Hachure => draw_hachure(s, el, &outline)?,
            FillStyle::None => {}
        }
    }

    s.set_stroke_style(stroke_override.unwrap_or(&el.style.stroke_color));
    s.set_line_width(el.style.stroke_width);
    // Text boxes have no border unless highlighted.
    let borderless = matches!(el.shape, Shape::Text | Shape::SelectionOutline);
    if !borderless || stroke_override.is_some() {
        s.stroke();
    }

    if let Shape::Arrow { start_point, end_point, .. } = el.shape {
        s.set_fill_style(stroke_override.unwrap_or(&el.style.stroke_color));
        draw_arrowhead(s, start_point, end_point);
    }

    if !el.text.is_empty() {
        draw_text(s, el)?;
    }

    s.restore();
    Ok(())
}

fn paints_fill(style: &Style) -> bool {
    style.fill_style != FillStyle::None && style.background_color != "transparent"
}

/// Build the outline as the current path.
fn trace_outline<S: Surface + ?Sized>(s: &mut S, outline: &Outline) -> Result<(), RenderError> {
    s.begin_path();
    match outline {
        Outline::Polygon(points) => {
            trace_points(s, points);
            s.close_path();
        }
        Outline::Ellipse { center, rx, ry } => s.ellipse(center.x, center.y, *rx, *ry)?,
        Outline::Polyline(points) => trace_points(s, points),
    }
    Ok(())
}

fn trace_points<S: Surface + ?Sized>(s: &mut S, points: &[Point]) {
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        s.move_to(first.x, first.y);
        // A lone point still needs a segment to show up as a dot.
        if points.len() == 1 {
            s.line_to(first.x, first.y);
        }
    }
    for p in iter {
        s.line_to(p.x, p.y);
    }
}

/// Diagonal strokes clipped to the outline.
fn draw_hachure<S: Surface + ?Sized>(s: &mut S, el: &Element, outline: &Outline) -> Result<(), RenderError> {
    s.save();
    s.clip();
    s.set_stroke_style(&el.style.background_color);
    s.set_line_width(1.0);
    s.begin_path();
    let b = el.bounds();
    let span = b.width + b.height;
    let mut offset = 0.0;
    while offset <= span {
        s.move_to(b.x + offset, b.y);
        s.line_to(b.x + offset - b.height, b.bottom());
        offset += HACHURE_GAP;
    }
    s.stroke();
    s.restore();
    // Clipping consumed the path; rebuild it for the outline stroke.
    trace_outline(s, outline)
}

fn draw_arrowhead<S: Surface + ?Sized>(s: &mut S, from: Point, tip: Point) {
    let angle = (tip.y - from.y).atan2(tip.x - from.x);
    let x1 = tip.x - ARROW_SIZE * (angle - ARROW_ANGLE).cos();
    let y1 = tip.y - ARROW_SIZE * (angle - ARROW_ANGLE).sin();
    let x2 = tip.x - ARROW_SIZE * (angle + ARROW_ANGLE).cos();
    let y2 = tip.y - ARROW_SIZE * (angle + ARROW_ANGLE).sin();

    s.begin_path();
    s.move_to(tip.x, tip.y);
    s.line_to(x1, y1);
    s.line_to(x2, y2);
    s.close_path();
    s.fill();
}

fn draw_text<S: Surface + ?Sized>(s: &mut S, el: &Element) -> Result<(), RenderError> {
    s.set_fill_style(&el.style.stroke_color);
    s.set_font(&format!("{TEXT_FONT_PX}px sans-serif"));
    for (i, line) in el.text.lines().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = el.y + TEXT_FONT_PX * (i as f64 + 1.0);
        s.fill_text(line, el.x, y)?;
    }
    Ok(())
}

// =============================================================
// Selection UI
// =============================================================

fn draw_selection<S: Surface + ?Sized>(s: &mut S, view: &FrameView<'_>) -> Result<(), RenderError> {
    let store = &view.scene.elements;
    let Some(bounds) = hit::selection_bounds(store) else {
        return Ok(());
    };
    let zoom = view.camera.zoom;
    let dash_world = SELECTION_DASH_PX / zoom;

    s.save();
    s.set_stroke_style(SELECTION_COLOR);
    s.set_line_width(1.0 / zoom);
    s.set_line_dash(&[dash_world, dash_world])?;
    for el in store.selected() {
        s.save();
        rotate_about_center(s, el)?;
        let b = el.bounds();
        s.begin_path();
        s.rect(b.x, b.y, b.width, b.height);
        s.stroke();
        s.restore();
    }
    if store.selected().nth(1).is_some() {
        let outline = Element::selection_outline(bounds, Style::default());
        s.begin_path();
        s.rect(outline.x, outline.y, outline.width, outline.height);
        s.stroke();
    }
    s.set_line_dash(&[])?;

    // Resize handles.
    let half = view.config.handle_radius_px / zoom / 2.0;
    s.set_fill_style("#fff");
    for anchor in ResizeAnchor::ALL {
        let p = anchor.position(&bounds);
        s.begin_path();
        s.rect(p.x - half, p.y - half, half * 2.0, half * 2.0);
        s.fill();
        s.stroke();
    }

    // Rotate handle and its stem.
    let rh = hit::rotate_handle_position(&bounds, view.camera, view.config);
    let n_handle = ResizeAnchor::N.position(&bounds);
    s.begin_path();
    s.move_to(n_handle.x, n_handle.y);
    s.line_to(rh.x, rh.y);
    s.stroke();
    s.begin_path();
    s.arc(rh.x, rh.y, half)?;
    s.fill();
    s.stroke();

    s.restore();
    Ok(())
}

fn draw_marquee<S: Surface + ?Sized>(s: &mut S, marquee: Rect, zoom: f64) -> Result<(), RenderError> {
    s.save();
    let dash_world = SELECTION_DASH_PX / zoom;
    s.set_line_dash(&[dash_world, dash_world])?;
    s.set_stroke_style(SELECTION_COLOR);
    s.set_fill_style("rgba(30, 144, 255, 0.12)");
    s.set_line_width(1.0 / zoom);
    s.begin_path();
    s.rect(marquee.x, marquee.y, marquee.width, marquee.height);
    s.fill();
    s.stroke();
    s.set_line_dash(&[])?;
    s.restore();
    Ok(())
}

// =============================================================
// Peers
// =============================================================

fn draw_peer<S: Surface + ?Sized>(s: &mut S, peer: &PeerState, zoom: f64) -> Result<(), RenderError> {
    if let Some(hint) = &peer.drawing_hint {
        let mut ghost = hint.clone();
        ghost.style.stroke_color.clone_from(&peer.peer_color);
        ghost.style.opacity = PEER_HINT_ALPHA;
        draw_element(s, &ghost, None)?;
    }

    let p = peer.cursor_position;
    draw_dot(s, p, ANCHOR_DOT_PX / zoom, &peer.peer_color)?;
    s.save();
    s.set_fill_style(&peer.peer_color);
    s.set_font(&format!("{}px sans-serif", 12.0 / zoom));
    s.fill_text(&peer.peer_name, p.x + 8.0 / zoom, p.y + 16.0 / zoom)?;
    s.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

fn draw_dot<S: Surface + ?Sized>(s: &mut S, p: Point, radius: f64, color: &str) -> Result<(), RenderError> {
    s.begin_path();
    s.arc(p.x, p.y, radius)?;
    s.set_fill_style(color);
    s.fill();
    Ok(())
}

/// Rotate the current transform by the element's angle about its box centre.
fn rotate_about_center<S: Surface + ?Sized>(s: &mut S, el: &Element) -> Result<(), RenderError> {
    if el.angle.abs() < f64::EPSILON {
        return Ok(());
    }
    let c = el.center();
    s.translate(c.x, c.y)?;
    s.rotate(el.angle)?;
    s.translate(-c.x, -c.y)?;
    Ok(())
}
