use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::binding::{self, AnchorCandidate};
use crate::camera::{Camera, Point};
use crate::config::CanvasConfig;
use crate::doc::{
    ArrowDirection, ConnectionId, Element, ElementId, ElementKind, ElementPatch, ElementStore, Scene, SceneSnapshot,
    Shape,
};
use crate::geometry::{self, Rect};
use crate::hit::{self, Hit, HitPart};
use crate::input::{Button, InputState, Modifiers, Tool, UiState};
use crate::presence::{PeerId, PeerState, PresenceChannel};
use crate::render::{self, FrameView, RenderError, Surface};
use crate::transform::{self, TransformSnapshot};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new element joined the scene.
    ElementCreated(ElementId),
    /// Existing elements changed geometry or content.
    ElementsUpdated(Vec<ElementId>),
    /// Elements were erased from the scene.
    ElementsRemoved(Vec<ElementId>),
    /// A new arrow connection was committed.
    ConnectionCreated(ConnectionId),
    /// The selection is now exactly these ids.
    SelectionChanged(Vec<ElementId>),
    /// Ask the host's text editor to edit this element.
    EditTextRequested { id: ElementId },
    SetCursor(String),
    /// World-space pointer position, for presence publishing.
    CursorMoved(Point),
    /// A completed gesture changed the scene; the host may persist `snapshot()`.
    SceneChanged,
    RenderNeeded,
}

/// Scene, camera, and gesture state: everything except the canvas element.
///
/// Kept apart from [`Engine`] so it runs natively in tests and in the CLI.
pub struct EngineCore {
    pub scene: Scene,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub config: CanvasConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    cursor_world: Option<Point>,
    cursor_name: String,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(CanvasConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: CanvasConfig) -> Self {
        Self {
            scene: Scene::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            cursor_world: None,
            cursor_name: "default".to_owned(),
        }
    }

    // --- Data inputs ---

    /// Replace the scene with a persisted snapshot, abandoning any gesture.
    pub fn load_snapshot(&mut self, snapshot: SceneSnapshot) {
        self.input = InputState::Idle;
        self.ui.clear_anchors();
        self.scene.load_snapshot(snapshot);
    }

    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    // --- Tool / text ---

    /// Set the active tool. Switching away mid-erase abandons the erase.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.ui.tool != tool {
            debug!(tool = ?tool, "tool changed");
            if matches!(self.input, InputState::ErasingBrush) {
                self.scene.elements.clear_marks();
                self.input = InputState::Idle;
            }
        }
        self.ui.tool = tool;
        self.ui.clear_anchors();
    }

    /// Commit text from the host editor into the element, committed or still being drawn.
    pub fn set_text(&mut self, id: &ElementId, text: String) -> Vec<Action> {
        if let InputState::DrawingNewElement { element, .. } = &mut self.input {
            if element.id == *id {
                element.text = text;
                return vec![Action::RenderNeeded];
            }
        }
        let patch = ElementPatch { text: Some(text), ..ElementPatch::default() };
        if self.scene.elements.by_id(id).is_some_and(|el| !el.is_deleted) && self.scene.elements.patch(id, &patch) {
            vec![Action::ElementsUpdated(vec![*id]), Action::SceneChanged, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
    }

    pub fn set_camera(&mut self, camera: Camera) -> Vec<Action> {
        self.camera = camera;
        vec![Action::RenderNeeded]
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.camera.pan_by(dx, dy);
        vec![Action::RenderNeeded]
    }

    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64) -> Vec<Action> {
        self.camera.zoom_at(screen_pt, factor);
        vec![Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if !self.input.is_idle() {
            debug!(state = self.input.name(), "finalizing stale gesture");
            actions.extend(self.finish_gesture());
        }

        let world = self.camera.screen_to_world(screen_pt);
        self.cursor_world = Some(world);
        let before = self.scene.elements.selected_ids();

        if self.ui.tool == Tool::Eraser {
            self.input = InputState::ErasingBrush;
            erase_at(&mut self.scene.elements, world);
            actions.push(Action::RenderNeeded);
            return actions;
        }

        match hit::hit_test(world, &self.scene.elements, &self.camera, &self.config) {
            Some(Hit { part: HitPart::RotateHandle, .. }) => {
                if let Some(snapshot) = TransformSnapshot::capture(&self.scene.elements) {
                    self.input = InputState::RotatingSelection { rotation_start: world, snapshot };
                }
            }
            Some(Hit { part: HitPart::ResizeHandle(anchor), .. }) => {
                if let Some(snapshot) = TransformSnapshot::capture(&self.scene.elements) {
                    self.input = InputState::ResizingSelection { anchor, start: world, snapshot };
                }
            }
            Some(Hit { element_id: Some(id), .. }) => {
                if self.element_selected(Some(id)) {
                    // Shift drops the pressed element, then the rest of the selection drags.
                    if modifiers.shift {
                        self.scene.elements.toggle_selected(&id);
                    }
                    self.begin_translate(world);
                } else if self.ui.tool == Tool::Selection {
                    if modifiers.shift {
                        self.scene.elements.set_selected(&id, true);
                    } else {
                        self.scene.elements.select_only(&[id]);
                    }
                    self.begin_translate(world);
                } else {
                    self.begin_drawing(world, &mut actions);
                }
            }
            _ if self.ui.tool == Tool::Selection => {
                if !modifiers.shift {
                    self.scene.elements.clear_selection();
                }
                self.input = InputState::MarqueeSelecting { anchor: world, current: world };
            }
            _ => self.begin_drawing(world, &mut actions),
        }

        if let Some(changed) = self.selection_change(&before) {
            actions.push(changed);
        }
        debug!(state = self.input.name(), "pointer down");
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        self.cursor_world = Some(world);
        let mut actions = vec![Action::CursorMoved(world)];

        let hover_changed = self.track_hover(world);
        let dragged = self.drag_to(world);
        if self.input.is_idle() {
            let name = self.idle_cursor(world);
            if name != self.cursor_name {
                self.cursor_name.clone_from(&name);
                actions.push(Action::SetCursor(name));
            }
        }
        if hover_changed || dragged {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || self.input.is_idle() {
            return Vec::new();
        }
        let world = self.camera.screen_to_world(screen_pt);
        self.cursor_world = Some(world);
        self.track_hover(world);
        self.drag_to(world);
        self.finish_gesture()
    }

    /// The pointer left the canvas; treated exactly as a primary release.
    pub fn on_pointer_leave(&mut self, screen_pt: Point) -> Vec<Action> {
        self.on_pointer_up(screen_pt, Button::Primary, Modifiers::default())
    }

    /// Select the element under the pointer and hand it to the text editor.
    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        let tolerance = self.camera.screen_dist_to_world(self.config.hit_tolerance_px);
        let Some(id) = hit::topmost_element_at(&self.scene.elements, world, tolerance).map(|el| el.id) else {
            return Vec::new();
        };
        let before = self.scene.elements.selected_ids();
        self.scene.elements.select_only(&[id]);
        let mut actions = Vec::new();
        if let Some(changed) = self.selection_change(&before) {
            actions.push(changed);
        }
        actions.push(Action::EditTextRequested { id });
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Render ---

    /// Draw the current state; without a mounted surface this does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first surface failure.
    pub fn render_into<S: Surface + ?Sized>(
        &self,
        surface: Option<&mut S>,
        peers: &[PeerState],
    ) -> Result<(), RenderError> {
        let Some(surface) = surface else {
            return Ok(());
        };
        let marquee = match self.input {
            InputState::MarqueeSelecting { anchor, current } => Some(Rect::from_corners(anchor, current)),
            _ => None,
        };
        let view = FrameView {
            scene: &self.scene,
            camera: &self.camera,
            config: &self.config,
            in_progress: self.drawing_element(),
            marquee,
            hover: self.ui.hover,
            anchors: [self.ui.arrow_start.map(|c| c.point), self.ui.arrow_end.map(|c| c.point)],
            peers,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            dpr: self.dpr,
        };
        render::draw(surface, &view)
    }

    // --- Queries ---

    /// Ids of the selected elements, in z-order.
    #[must_use]
    pub fn selection(&self) -> Vec<ElementId> {
        self.scene.elements.selected_ids()
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// The element being drawn, before it joins the scene.
    #[must_use]
    pub fn drawing_element(&self) -> Option<&Element> {
        match &self.input {
            InputState::DrawingNewElement { element, .. } => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub fn hover(&self) -> Option<AnchorCandidate> {
        self.ui.hover
    }

    /// Last known world-space pointer position.
    #[must_use]
    pub fn cursor_world(&self) -> Option<Point> {
        self.cursor_world
    }

    // --- Gesture internals ---

    fn begin_translate(&mut self, world: Point) {
        if let Some(snapshot) = TransformSnapshot::capture(&self.scene.elements) {
            self.input = InputState::TranslatingSelection { start: world, snapshot };
        }
    }

    fn begin_drawing(&mut self, world: Point, actions: &mut Vec<Action>) {
        let Some(kind) = self.ui.tool.element_kind() else {
            return;
        };
        self.scene.elements.clear_selection();
        let mut element = Element::new(kind, world, self.config.default_style.clone());
        match kind {
            ElementKind::Text => {
                element.width = self.config.text_default_width;
                element.height = self.config.text_default_height;
                element.is_selected = true;
                actions.push(Action::EditTextRequested { id: element.id });
            }
            ElementKind::Arrow => {
                let tolerance = self.camera.screen_dist_to_world(self.config.hit_tolerance_px);
                self.ui.arrow_start = binding::anchor_candidate(&self.scene.elements, world, tolerance);
                self.ui.arrow_end = None;
            }
            _ => {}
        }
        self.input = InputState::DrawingNewElement { element, start: world };
    }

    /// Apply the active gesture at `world`. Returns whether anything changed.
    fn drag_to(&mut self, world: Point) -> bool {
        match &mut self.input {
            InputState::Idle => false,
            InputState::ErasingBrush => erase_at(&mut self.scene.elements, world),
            InputState::RotatingSelection { rotation_start, snapshot } => {
                transform::rotate(&mut self.scene.elements, snapshot, *rotation_start, world);
                true
            }
            InputState::ResizingSelection { anchor, start, snapshot } => {
                transform::resize(&mut self.scene.elements, snapshot, *anchor, *start, world);
                true
            }
            InputState::TranslatingSelection { start, snapshot } => {
                transform::translate(&mut self.scene.elements, snapshot, world.x - start.x, world.y - start.y);
                true
            }
            InputState::MarqueeSelecting { current, .. } => {
                *current = world;
                true
            }
            InputState::DrawingNewElement { element, start } => {
                reshape(element, *start, world);
                true
            }
        }
    }

    /// Release the active gesture and commit its result.
    fn finish_gesture(&mut self) -> Vec<Action> {
        let before = self.scene.elements.selected_ids();
        let state = std::mem::take(&mut self.input);
        let mut actions = Vec::new();
        match state {
            InputState::Idle => return actions,
            InputState::ErasingBrush => {
                let removed = self.scene.remove_marked();
                if !removed.is_empty() {
                    debug!(count = removed.len(), "erased elements");
                    actions.push(Action::ElementsRemoved(removed));
                    actions.push(Action::SceneChanged);
                }
            }
            InputState::MarqueeSelecting { anchor, current } => {
                let marquee = Rect::from_corners(anchor, current);
                let hits: Vec<ElementId> = self
                    .scene
                    .elements
                    .live()
                    .filter(|el| geometry::rotated_bounds(el).intersects(&marquee))
                    .map(|el| el.id)
                    .collect();
                for id in &hits {
                    self.scene.elements.set_selected(id, true);
                }
            }
            InputState::RotatingSelection { snapshot, .. }
            | InputState::ResizingSelection { snapshot, .. }
            | InputState::TranslatingSelection { snapshot, .. } => {
                let changed: Vec<ElementId> = snapshot
                    .elements
                    .iter()
                    .filter(|orig| self.scene.elements.by_id(&orig.id).is_some_and(|el| geometry_differs(el, orig)))
                    .map(|orig| orig.id)
                    .collect();
                if !changed.is_empty() {
                    actions.push(Action::ElementsUpdated(changed));
                    actions.push(Action::SceneChanged);
                }
            }
            InputState::DrawingNewElement { element, .. } => {
                let id = element.id;
                if element.kind() == ElementKind::Arrow {
                    let start = self.ui.arrow_start.take();
                    let end = self.ui.arrow_end.take();
                    let connection = binding::bind_arrow(&mut self.scene, element, start, end);
                    actions.push(Action::ElementCreated(id));
                    actions.push(Action::ConnectionCreated(connection));
                } else {
                    self.scene.elements.upsert(element);
                    actions.push(Action::ElementCreated(id));
                }
                debug!(id = %id, "element committed");
                actions.push(Action::SceneChanged);
            }
        }
        self.ui.clear_anchors();
        if let Some(changed) = self.selection_change(&before) {
            actions.push(changed);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Refresh the hover candidate while the arrow tool or a lone selected arrow
    /// is active. Returns whether the candidate changed.
    fn track_hover(&mut self, world: Point) -> bool {
        let selected: Vec<&Element> = self.scene.elements.selected().collect();
        let arrow_selected = selected.len() == 1 && selected[0].kind() == ElementKind::Arrow;
        if self.ui.tool != Tool::Arrow && !arrow_selected {
            let changed = self.ui.hover.is_some();
            self.ui.hover = None;
            return changed;
        }

        let tolerance = self.camera.screen_dist_to_world(self.config.hit_tolerance_px);
        let candidate = binding::anchor_candidate(&self.scene.elements, world, tolerance);
        let changed = candidate != self.ui.hover;
        self.ui.hover = candidate;
        let drawing_arrow = self.drawing_element().is_some_and(|el| el.kind() == ElementKind::Arrow);
        if drawing_arrow {
            self.ui.arrow_end = candidate;
        } else if self.input.is_idle() {
            self.ui.arrow_start = candidate;
        }
        changed
    }

    fn idle_cursor(&self, world: Point) -> String {
        if self.ui.tool == Tool::Eraser {
            return "default".to_owned();
        }
        let drawing = self.ui.tool.element_kind().is_some();
        let name = match hit::hit_test(world, &self.scene.elements, &self.camera, &self.config) {
            Some(Hit { part: HitPart::RotateHandle, .. }) => "grab",
            Some(Hit { part: HitPart::ResizeHandle(anchor), .. }) => anchor.cursor(),
            Some(Hit { element_id, .. }) if self.element_selected(element_id) => "move",
            _ if drawing => "crosshair",
            _ => "default",
        };
        name.to_owned()
    }

    fn element_selected(&self, id: Option<ElementId>) -> bool {
        id.and_then(|id| self.scene.elements.by_id(&id)).is_some_and(|el| el.is_selected)
    }

    fn selection_change(&self, before: &[ElementId]) -> Option<Action> {
        let after = self.scene.elements.selected_ids();
        (after != before).then_some(Action::SelectionChanged(after))
    }
}

/// Mark every live element whose bounding box contains `world`.
fn erase_at(store: &mut ElementStore, world: Point) -> bool {
    let ids: Vec<ElementId> = store
        .live()
        .filter(|el| !el.is_marked_for_deletion && geometry::rotated_bounds(el).contains(world))
        .map(|el| el.id)
        .collect();
    let mut marked = false;
    for id in ids {
        marked |= store.mark_for_deletion(&id);
    }
    marked
}

/// Recompute an in-progress element from the drag start and the pointer.
fn reshape(element: &mut Element, start: Point, current: Point) {
    match &mut element.shape {
        Shape::Freedraw { points } => {
            if points.last() != Some(&current) {
                points.push(current);
            }
        }
        Shape::Rectangle | Shape::Ellipse | Shape::Diamond | Shape::Rhombus => {
            element.x = start.x;
            element.y = start.y;
            element.width = current.x - start.x;
            element.height = current.y - start.y;
        }
        Shape::Line { end_point, .. } => *end_point = current,
        Shape::Arrow { start_point, end_point, direction, .. } => {
            *end_point = current;
            *direction = ArrowDirection::between(*start_point, current);
        }
        Shape::Text | Shape::SelectionOutline => {}
    }
    element.normalize();
}

fn geometry_differs(current: &Element, original: &Element) -> bool {
    current.bounds() != original.bounds()
        || current.shape != original.shape
        || (current.angle - original.angle).abs() > f64::EPSILON
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
    presence: Option<PresenceChannel<js_sys::Function>>,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self::with_config(canvas, CanvasConfig::default())
    }

    #[must_use]
    pub fn with_config(canvas: HtmlCanvasElement, config: CanvasConfig) -> Self {
        Self { canvas, core: EngineCore::with_config(config), presence: None }
    }

    // --- Presence ---

    /// Start publishing the local cursor through `send`.
    pub fn connect_presence(&mut self, peer_id: PeerId, peer_name: String, peer_color: String, send: js_sys::Function) {
        let stale_ms = self.core.config.presence_stale_ms;
        self.presence = Some(PresenceChannel::new(peer_id, peer_name, peer_color, send, stale_ms));
    }

    /// Merge a peer payload delivered by the host. Returns whether a redraw is needed.
    pub fn receive_presence(&mut self, payload: &str, now_ms: i64) -> bool {
        let Some(channel) = self.presence.as_mut() else {
            return false;
        };
        match channel.receive(payload, now_ms) {
            Ok(merged) => merged,
            Err(e) => {
                warn!(error = %e, "dropping presence payload");
                false
            }
        }
    }

    /// Forget a peer the host saw disconnect. Returns whether it was known.
    pub fn remove_presence_peer(&mut self, peer_id: &str) -> bool {
        self.presence.as_mut().is_some_and(|channel| channel.remove_peer(peer_id))
    }

    /// Forget peers not heard from recently. Returns whether any were dropped.
    pub fn prune_presence(&mut self, now_ms: i64) -> bool {
        self.presence.as_mut().is_some_and(|channel| !channel.prune_stale(now_ms).is_empty())
    }

    fn publish_presence(&mut self, actions: &[Action]) {
        let Some(cursor) = actions.iter().rev().find_map(|a| match a {
            Action::CursorMoved(p) => Some(*p),
            _ => None,
        }) else {
            return;
        };
        let hint = self.core.drawing_element().cloned();
        if let Some(channel) = self.presence.as_mut() {
            if let Err(e) = channel.publish(cursor, hint) {
                warn!(error = %e, "presence publish failed");
            }
        }
    }

    // --- Delegated data inputs ---

    pub fn load_snapshot(&mut self, snapshot: SceneSnapshot) {
        self.core.load_snapshot(snapshot);
    }

    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        self.core.snapshot()
    }

    /// Select a tool by the name the toolbar sends. Unknown names are ignored.
    pub fn set_tool(&mut self, name: &str) -> bool {
        let Some(tool) = Tool::from_name(name) else {
            warn!(name, "unknown tool");
            return false;
        };
        self.core.set_tool(tool);
        true
    }

    pub fn set_text(&mut self, id: &ElementId, text: String) -> Vec<Action> {
        self.core.set_text(id, text)
    }

    // --- Viewport ---

    /// Update viewport dimensions and resize the backing store to match.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        self.core.pan_by(dx, dy)
    }

    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64) -> Vec<Action> {
        self.core.zoom_at(screen_pt, factor)
    }

    // --- Input events ---

    /// `button` is the DOM `MouseEvent.button` code.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: i16, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, Button::from_dom(button), modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.core.on_pointer_move(screen_pt, modifiers);
        self.publish_presence(&actions);
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: i16, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, Button::from_dom(button), modifiers)
    }

    pub fn on_pointer_leave(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_leave(screen_pt)
    }

    pub fn on_double_click(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_double_click(screen_pt)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    pub fn render(&self) {
        let mut ctx = self.context();
        let peers = self.peers();
        if let Err(e) = self.core.render_into(ctx.as_mut(), &peers) {
            warn!(error = %e, "render failed");
        }
    }

    fn context(&self) -> Option<CanvasRenderingContext2d> {
        match self.canvas.get_context("2d") {
            Ok(Some(obj)) => match obj.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => Some(ctx),
                Err(_) => {
                    warn!("canvas context is not 2d");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = ?e, "canvas context unavailable");
                None
            }
        }
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Vec<ElementId> {
        self.core.selection()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.core.camera()
    }

    #[must_use]
    pub fn peers(&self) -> Vec<PeerState> {
        self.presence.as_ref().map(|c| c.peers().into_iter().cloned().collect()).unwrap_or_default()
    }
}
