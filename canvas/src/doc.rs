//! Document model: scene elements, arrow connections, and the stores that own them.
//!
//! This module defines the closed set of element variants (`Shape`), the
//! binding record linking arrows to shapes (`Connection`), a sparse-update
//! type for in-place edits (`ElementPatch`), and the runtime arena that owns
//! every live entity (`Scene`, made of an `ElementStore` and a
//! `ConnectionStore`). Entities refer to each other by id only.
//!
//! Data flows into this layer from the input engine (gesture commits,
//! transforms, selection) and from the persistence collaborator
//! (`Scene::from_snapshot`). The renderer reads element order straight from
//! `ElementStore::list`, which is z-order: later entries draw on top.
//!
//! Mutators never fail loudly. They report "did not apply" as `false` /
//! `None`.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::MIN_EXTENT;
use crate::geometry::{self, Rect};

/// Unique identifier for a scene element.
pub type ElementId = Uuid;

/// Unique identifier for an arrow connection.
pub type ConnectionId = Uuid;

// =============================================================
// Element kinds and style
// =============================================================

/// Fieldless discriminant of an element's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Freedraw,
    Rectangle,
    Ellipse,
    Diamond,
    Rhombus,
    Line,
    Arrow,
    Text,
    /// Synthetic group outline; render-only, never stored.
    SelectionOutline,
}

impl ElementKind {
    /// Two-endpoint connectors.
    #[must_use]
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }
}

/// Side of a bound shape an arrow endpoint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Coarse heading of an arrow, from its start point toward its end point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl ArrowDirection {
    /// Vertical movement dominates whenever the endpoints differ in `y`.
    #[must_use]
    pub fn between(start: Point, end: Point) -> Self {
        if end.y > start.y {
            Self::Down
        } else if end.y < start.y {
            Self::Up
        } else if end.x >= start.x {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// How an element's interior is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStyle {
    #[default]
    Solid,
    Hachure,
    None,
}

/// Stroke and fill configuration shared by every element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    /// Outline color as a CSS color string.
    pub stroke_color: String,
    /// Interior color as a CSS color string.
    pub background_color: String,
    pub fill_style: FillStyle,
    /// Outline width in world units.
    pub stroke_width: f64,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: "#1e1e1e".to_owned(),
            background_color: "transparent".to_owned(),
            fill_style: FillStyle::Solid,
            stroke_width: 2.0,
            opacity: 1.0,
        }
    }
}

// =============================================================
// Element
// =============================================================

/// Variant-specific element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Shape {
    /// Free-hand stroke; never empty once created.
    Freedraw { points: Vec<Point> },
    Rectangle,
    Ellipse,
    Diamond,
    Rhombus,
    Line { start_point: Point, end_point: Point },
    Arrow {
        start_point: Point,
        end_point: Point,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_side: Option<Side>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_side: Option<Side>,
        #[serde(default)]
        direction: ArrowDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connection_id: Option<ConnectionId>,
    },
    Text,
    SelectionOutline,
}

/// A drawable scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub shape: Shape,
    /// Left edge of the unrotated bounding box.
    pub x: f64,
    /// Top edge of the unrotated bounding box.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation about the box centre, radians in `[0, 2π)`.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_deleted: bool,
    /// Pending eraser removal; only ever set during an erase gesture.
    #[serde(skip)]
    pub is_marked_for_deletion: bool,
    #[serde(default)]
    pub text: String,
    /// Connections whose start or end is bound to this element.
    #[serde(default)]
    pub connection_ids: Vec<ConnectionId>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub version_nonce: u32,
}

impl Element {
    /// A zero-size element of `kind` anchored at `at`.
    #[must_use]
    pub fn new(kind: ElementKind, at: Point, style: Style) -> Self {
        let shape = match kind {
            ElementKind::Freedraw => Shape::Freedraw { points: vec![at] },
            ElementKind::Rectangle => Shape::Rectangle,
            ElementKind::Ellipse => Shape::Ellipse,
            ElementKind::Diamond => Shape::Diamond,
            ElementKind::Rhombus => Shape::Rhombus,
            ElementKind::Line => Shape::Line { start_point: at, end_point: at },
            ElementKind::Arrow => Shape::Arrow {
                start_point: at,
                end_point: at,
                start_side: None,
                end_side: None,
                direction: ArrowDirection::default(),
                connection_id: None,
            },
            ElementKind::Text => Shape::Text,
            ElementKind::SelectionOutline => Shape::SelectionOutline,
        };
        Self {
            id: Uuid::new_v4(),
            shape,
            x: at.x,
            y: at.y,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
            style,
            is_selected: false,
            is_deleted: false,
            is_marked_for_deletion: false,
            text: String::new(),
            connection_ids: Vec::new(),
            version: 0,
            version_nonce: fresh_nonce(),
        }
    }

    /// The synthetic outline drawn around a multi-element selection.
    #[must_use]
    pub fn selection_outline(bounds: Rect, style: Style) -> Self {
        let mut el = Self::new(ElementKind::SelectionOutline, Point::new(bounds.x, bounds.y), style);
        el.width = bounds.width;
        el.height = bounds.height;
        el.is_selected = true;
        el
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self.shape {
            Shape::Freedraw { .. } => ElementKind::Freedraw,
            Shape::Rectangle => ElementKind::Rectangle,
            Shape::Ellipse => ElementKind::Ellipse,
            Shape::Diamond => ElementKind::Diamond,
            Shape::Rhombus => ElementKind::Rhombus,
            Shape::Line { .. } => ElementKind::Line,
            Shape::Arrow { .. } => ElementKind::Arrow,
            Shape::Text => ElementKind::Text,
            Shape::SelectionOutline => ElementKind::SelectionOutline,
        }
    }

    /// Unrotated bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Centre of the unrotated bounding box; the rotation pivot.
    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// The arrow's connection, if this is a bound arrow.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self.shape {
            Shape::Arrow { connection_id, .. } => connection_id,
            _ => None,
        }
    }

    /// Endpoints of a line or arrow.
    #[must_use]
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match self.shape {
            Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. } => {
                Some((start_point, end_point))
            }
            _ => None,
        }
    }

    /// Whether the box is derived from sub-geometry (points or endpoints).
    #[must_use]
    pub fn has_point_geometry(&self) -> bool {
        matches!(self.shape, Shape::Freedraw { .. } | Shape::Line { .. } | Shape::Arrow { .. })
    }

    /// Apply `f` to every sub-geometry point (freedraw points, line/arrow endpoints).
    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        match &mut self.shape {
            Shape::Freedraw { points } => {
                for p in points.iter_mut() {
                    *p = f(*p);
                }
            }
            Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. } => {
                *start_point = f(*start_point);
                *end_point = f(*end_point);
            }
            _ => {}
        }
    }

    /// Offset position and sub-geometry by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.map_points(|p| p.offset(dx, dy));
    }

    /// Re-derive the box from sub-geometry, or flip negative extents for box shapes.
    pub fn normalize(&mut self) {
        let envelope = match &self.shape {
            Shape::Freedraw { points } => Rect::envelope(points.iter().copied()),
            Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. } => {
                Some(Rect::from_corners(*start_point, *end_point))
            }
            _ => None,
        };
        if let Some(b) = envelope {
            self.x = b.x;
            self.y = b.y;
            self.width = b.width;
            self.height = b.height;
        } else {
            if self.width < 0.0 {
                self.x += self.width;
                self.width = -self.width;
            }
            if self.height < 0.0 {
                self.y += self.height;
                self.height = -self.height;
            }
        }
        self.angle = geometry::normalize_angle(self.angle);
    }

    /// Copy position, extent, angle, and sub-geometry from `other`, keeping
    /// identity, flags, text, and arrow binding.
    pub fn copy_geometry_from(&mut self, other: &Element) {
        self.x = other.x;
        self.y = other.y;
        self.width = other.width;
        self.height = other.height;
        self.angle = other.angle;
        match (&mut self.shape, &other.shape) {
            (Shape::Freedraw { points }, Shape::Freedraw { points: src }) => points.clone_from(src),
            (
                Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. },
                Shape::Line { start_point: s, end_point: e } | Shape::Arrow { start_point: s, end_point: e, .. },
            ) => {
                *start_point = *s;
                *end_point = *e;
            }
            _ => {}
        }
    }
}

fn fresh_nonce() -> u32 {
    let bytes = Uuid::new_v4().into_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Store-local logical clock stamping `version` / `version_nonce`.
#[derive(Debug, Default, Clone)]
struct Clock {
    now: u64,
}

impl Clock {
    fn tick(&mut self) -> (u64, u32) {
        self.now += 1;
        (self.now, fresh_nonce())
    }

    fn observe(&mut self, version: u64) {
        self.now = self.now.max(version);
    }
}

// =============================================================
// Sparse element updates
// =============================================================

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New angle in radians; wrapped into `[0, 2π)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    /// Replacement freedraw path; ignored when empty or for other kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_point: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Point>,
}

impl ElementPatch {
    fn touches_box(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }
}

/// Apply `patch` to `el`, keeping the box consistent with any sub-geometry.
fn apply_patch(el: &mut Element, patch: &ElementPatch) {
    match &mut el.shape {
        Shape::Freedraw { points } => {
            if let Some(new_points) = patch.points.as_ref().filter(|p| !p.is_empty()) {
                points.clone_from(new_points);
            }
        }
        Shape::Line { start_point, end_point } | Shape::Arrow { start_point, end_point, .. } => {
            if let Some(s) = patch.start_point {
                *start_point = s;
            }
            if let Some(e) = patch.end_point {
                *end_point = e;
            }
        }
        _ => {}
    }
    if el.has_point_geometry() {
        el.normalize();
    }

    if patch.touches_box() {
        let from = el.bounds();
        let to = Rect::new(
            patch.x.unwrap_or(from.x),
            patch.y.unwrap_or(from.y),
            patch.width.unwrap_or(from.width),
            patch.height.unwrap_or(from.height),
        );
        if el.has_point_geometry() {
            el.map_points(|p| remap_axis_point(p, from, to));
        } else {
            el.x = to.x;
            el.y = to.y;
            el.width = to.width;
            el.height = to.height;
        }
    }

    if let Some(angle) = patch.angle {
        el.angle = angle;
    }
    if let Some(text) = &patch.text {
        el.text.clone_from(text);
    }
    if let Some(style) = &patch.style {
        el.style = style.clone();
    }
    el.normalize();
}

/// Map `p` from box `from` to box `to`; a degenerate source axis only offsets.
fn remap_axis_point(p: Point, from: Rect, to: Rect) -> Point {
    let x = if from.width.abs() > MIN_EXTENT {
        to.x + (p.x - from.x) * (to.width / from.width)
    } else {
        p.x + (to.x - from.x)
    };
    let y = if from.height.abs() > MIN_EXTENT {
        to.y + (p.y - from.y) * (to.height / from.height)
    } else {
        p.y + (to.y - from.y)
    };
    Point::new(x, y)
}

// =============================================================
// Element store
// =============================================================

/// Ordered collection of elements; list order is z-order.
#[derive(Debug, Default, Clone)]
pub struct ElementStore {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    clock: Clock,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All elements in z-order, deleted ones included.
    #[must_use]
    pub fn list(&self) -> &[Element] {
        &self.elements
    }

    /// Non-deleted elements in z-order.
    pub fn live(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.iter().filter(|el| !el.is_deleted)
    }

    #[must_use]
    pub fn by_id(&self, id: &ElementId) -> Option<&Element> {
        self.index.get(id).and_then(|&i| self.elements.get(i))
    }

    fn by_id_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        let i = *self.index.get(id)?;
        self.elements.get_mut(i)
    }

    /// Run `f` on the element and stamp a new version. Returns false if absent.
    fn update(&mut self, id: &ElementId, f: impl FnOnce(&mut Element)) -> bool {
        let (version, nonce) = self.clock.tick();
        let Some(el) = self.by_id_mut(id) else {
            return false;
        };
        f(el);
        el.version = version;
        el.version_nonce = nonce;
        true
    }

    /// Insert or replace an element, normalizing its geometry. A new id is
    /// appended on top of the z-order; an existing id keeps its slot.
    pub fn upsert(&mut self, mut element: Element) {
        element.normalize();
        if element.is_deleted {
            element.is_selected = false;
        }
        let (version, nonce) = self.clock.tick();
        element.version = version;
        element.version_nonce = nonce;
        match self.index.get(&element.id).copied() {
            Some(i) => self.elements[i] = element,
            None => {
                self.index.insert(element.id, self.elements.len());
                self.elements.push(element);
            }
        }
    }

    /// Apply a sparse update. Returns false if the element doesn't exist.
    pub fn patch(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        self.update(id, |el| apply_patch(el, patch))
    }

    /// Overwrite geometry with `source`'s, keeping everything else.
    pub fn set_geometry(&mut self, id: &ElementId, source: &Element) -> bool {
        self.update(id, |el| {
            el.copy_geometry_from(source);
            el.normalize();
        })
    }

    /// Flag an element deleted and drop it from the selection.
    /// Returns false if it doesn't exist or is already deleted.
    pub fn soft_delete(&mut self, id: &ElementId) -> bool {
        if self.by_id(id).is_none_or(|el| el.is_deleted) {
            return false;
        }
        self.update(id, |el| {
            el.is_deleted = true;
            el.is_selected = false;
        })
    }

    pub(crate) fn add_connection_ref(&mut self, id: &ElementId, connection: ConnectionId) -> bool {
        self.update(id, |el| {
            if !el.connection_ids.contains(&connection) {
                el.connection_ids.push(connection);
            }
        })
    }

    pub(crate) fn remove_connection_ref(&mut self, id: &ElementId, connection: &ConnectionId) -> bool {
        self.update(id, |el| el.connection_ids.retain(|c| c != connection))
    }

    pub(crate) fn clear_arrow_connection(&mut self, id: &ElementId) -> bool {
        self.update(id, |el| {
            if let Shape::Arrow { connection_id, .. } = &mut el.shape {
                *connection_id = None;
            }
        })
    }

    // --- Selection ---

    /// Set one element's selection flag. Deleted elements cannot be selected.
    pub fn set_selected(&mut self, id: &ElementId, selected: bool) -> bool {
        match self.by_id_mut(id) {
            Some(el) if !(selected && el.is_deleted) => {
                el.is_selected = selected;
                true
            }
            _ => false,
        }
    }

    /// Flip one element's membership; returns the new membership.
    pub fn toggle_selected(&mut self, id: &ElementId) -> bool {
        let now = self.by_id(id).is_some_and(|el| !el.is_selected && !el.is_deleted);
        self.set_selected(id, now);
        now
    }

    /// Replace the selection with `ids` (unknown or deleted ids are ignored).
    pub fn select_only(&mut self, ids: &[ElementId]) {
        for el in &mut self.elements {
            el.is_selected = !el.is_deleted && ids.contains(&el.id);
        }
    }

    /// Deselect everything. Returns true if anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let mut changed = false;
        for el in &mut self.elements {
            changed |= el.is_selected;
            el.is_selected = false;
        }
        changed
    }

    /// Ids of selected elements in z-order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.selected().map(|el| el.id).collect()
    }

    /// Selected elements in z-order.
    pub fn selected(&self) -> impl Iterator<Item = &Element> {
        self.live().filter(|el| el.is_selected)
    }

    // --- Eraser marks ---

    /// Flag an element for eraser removal. Returns true if newly marked.
    pub fn mark_for_deletion(&mut self, id: &ElementId) -> bool {
        match self.by_id_mut(id) {
            Some(el) if !el.is_deleted && !el.is_marked_for_deletion => {
                el.is_marked_for_deletion = true;
                true
            }
            _ => false,
        }
    }

    /// Reset every pending eraser mark.
    pub fn clear_marks(&mut self) {
        for el in &mut self.elements {
            el.is_marked_for_deletion = false;
        }
    }

    /// Physically remove every marked element, returning them in z-order.
    fn take_marked(&mut self) -> Vec<Element> {
        let (removed, kept): (Vec<Element>, Vec<Element>) =
            std::mem::take(&mut self.elements).into_iter().partition(|el| el.is_marked_for_deletion);
        self.elements = kept;
        self.reindex();
        removed
    }

    fn reindex(&mut self) {
        self.index = self.elements.iter().enumerate().map(|(i, el)| (el.id, i)).collect();
    }

    /// Replace all elements with a snapshot, preserving order.
    fn load(&mut self, elements: Vec<Element>) {
        for el in &elements {
            self.clock.observe(el.version);
        }
        self.elements = elements;
        self.reindex();
    }

    /// Number of elements, deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the store contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

// =============================================================
// Connections
// =============================================================

/// Binding record linking an arrow's endpoints to the shapes they attach to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    /// The owning arrow.
    pub arrow_element_id: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_element_id: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_element_id: Option<ElementId>,
    /// Radians from the start element's centre to the attachment point, at bind time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<f64>,
    /// Radians from the end element's centre to the attachment point, at bind time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_angle: Option<f64>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub version_nonce: u32,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Connection {
    /// An unbound connection owned by `arrow_element_id`.
    #[must_use]
    pub fn new(arrow_element_id: ElementId) -> Self {
        Self {
            id: Uuid::new_v4(),
            arrow_element_id,
            start_element_id: None,
            end_element_id: None,
            start_angle: None,
            end_angle: None,
            version: 0,
            version_nonce: fresh_nonce(),
            is_deleted: false,
        }
    }

    /// Bound element ids (start first), skipping unbound ends.
    pub fn bound_elements(&self) -> impl Iterator<Item = ElementId> {
        self.start_element_id.into_iter().chain(self.end_element_id)
    }
}

/// Ordered collection of connections.
#[derive(Debug, Default, Clone)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    index: HashMap<ConnectionId, usize>,
    clock: Clock,
}

impl ConnectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All connections in creation order, deleted ones included.
    #[must_use]
    pub fn list(&self) -> &[Connection] {
        &self.connections
    }

    /// Non-deleted connections.
    pub fn live(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| !c.is_deleted)
    }

    #[must_use]
    pub fn by_id(&self, id: &ConnectionId) -> Option<&Connection> {
        self.index.get(id).and_then(|&i| self.connections.get(i))
    }

    /// Insert or replace a connection.
    pub fn upsert(&mut self, mut connection: Connection) {
        let (version, nonce) = self.clock.tick();
        connection.version = version;
        connection.version_nonce = nonce;
        match self.index.get(&connection.id).copied() {
            Some(i) => self.connections[i] = connection,
            None => {
                self.index.insert(connection.id, self.connections.len());
                self.connections.push(connection);
            }
        }
    }

    /// Flag a connection deleted. Returns false if absent or already deleted.
    pub fn soft_delete(&mut self, id: &ConnectionId) -> bool {
        let (version, nonce) = self.clock.tick();
        let Some(conn) = self.index.get(id).and_then(|&i| self.connections.get_mut(i)) else {
            return false;
        };
        if conn.is_deleted {
            return false;
        }
        conn.is_deleted = true;
        conn.version = version;
        conn.version_nonce = nonce;
        true
    }

    fn load(&mut self, connections: Vec<Connection>) {
        for c in &connections {
            self.clock.observe(c.version);
        }
        self.index = connections.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        self.connections = connections;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =============================================================
// Scene
// =============================================================

/// Serializable copy of both stores, handed to the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A broken scene invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    #[error("element {0} is selected but deleted")]
    SelectedDeleted(ElementId),
    #[error("element {0} has a negative extent")]
    NegativeExtent(ElementId),
    #[error("element {0} has an angle outside [0, 2π)")]
    AngleOutOfRange(ElementId),
    #[error("freedraw element {0} has no points")]
    EmptyFreedraw(ElementId),
    #[error("freedraw element {0} box is not the envelope of its points")]
    FreedrawEnvelope(ElementId),
    #[error("arrow {arrow} references missing or deleted connection {connection}")]
    DanglingArrowConnection { arrow: ElementId, connection: ConnectionId },
    #[error("connection {connection} is owned by {owner}, not arrow {arrow}")]
    ConnectionOwnerMismatch { connection: ConnectionId, owner: ElementId, arrow: ElementId },
    #[error("connection {connection} binds element {element}, which does not list it")]
    MissingBackReference { connection: ConnectionId, element: ElementId },
    #[error("element {element} lists deleted or unknown connection {connection}")]
    StaleBackReference { element: ElementId, connection: ConnectionId },
}

/// The arena owning every element and connection.
///
/// Operations touching both stores are single calls here, so a redraw can
/// never observe one half of a cross-store update.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    pub elements: ElementStore,
    pub connections: ConnectionStore,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a persisted snapshot, preserving element order.
    #[must_use]
    pub fn from_snapshot(snapshot: SceneSnapshot) -> Self {
        let mut scene = Self::new();
        scene.load_snapshot(snapshot);
        scene
    }

    /// Replace both stores with a snapshot.
    pub fn load_snapshot(&mut self, snapshot: SceneSnapshot) {
        self.elements.load(snapshot.elements);
        self.connections.load(snapshot.connections);
    }

    /// Copy both stores out for persistence.
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self.elements.list().to_vec(),
            connections: self.connections.list().to_vec(),
        }
    }

    /// Append a finished arrow together with its connection and back-links.
    pub fn commit_arrow(&mut self, mut arrow: Element, connection: Connection) {
        if let Shape::Arrow { connection_id, .. } = &mut arrow.shape {
            *connection_id = Some(connection.id);
        }
        for element_id in connection.bound_elements() {
            self.elements.add_connection_ref(&element_id, connection.id);
        }
        self.elements.upsert(arrow);
        self.connections.upsert(connection);
    }

    /// Soft-delete an element, cascading to the connections it participates in.
    pub fn soft_delete_element(&mut self, id: &ElementId) -> bool {
        let Some(el) = self.elements.by_id(id) else {
            return false;
        };
        let cascade: Vec<ConnectionId> = el.connection_ids.iter().copied().chain(el.connection_id()).collect();
        if !self.elements.soft_delete(id) {
            return false;
        }
        for connection_id in cascade {
            self.soft_delete_connection(&connection_id);
        }
        true
    }

    /// Soft-delete a connection and unlink it from its arrow and bound elements.
    pub fn soft_delete_connection(&mut self, id: &ConnectionId) -> bool {
        let Some(conn) = self.connections.by_id(id).filter(|c| !c.is_deleted).cloned() else {
            return false;
        };
        self.connections.soft_delete(id);
        for element_id in conn.bound_elements() {
            self.elements.remove_connection_ref(&element_id, id);
        }
        if self.elements.by_id(&conn.arrow_element_id).and_then(Element::connection_id) == Some(*id) {
            self.elements.clear_arrow_connection(&conn.arrow_element_id);
        }
        true
    }

    /// Hard-remove every element flagged for deletion, returning their ids.
    pub fn remove_marked(&mut self) -> Vec<ElementId> {
        let removed = self.elements.take_marked();
        for el in &removed {
            for connection_id in el.connection_ids.iter().copied().chain(el.connection_id()) {
                self.soft_delete_connection(&connection_id);
            }
        }
        removed.into_iter().map(|el| el.id).collect()
    }

    /// Evaluate every scene invariant; an empty result means the scene is consistent.
    #[must_use]
    pub fn check(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for el in self.elements.list() {
            check_element(el, &mut out);
            if el.is_deleted {
                continue;
            }
            if let Some(connection) = el.connection_id() {
                match self.connections.by_id(&connection).filter(|c| !c.is_deleted) {
                    None => out.push(Violation::DanglingArrowConnection { arrow: el.id, connection }),
                    Some(c) if c.arrow_element_id != el.id => out.push(Violation::ConnectionOwnerMismatch {
                        connection,
                        owner: c.arrow_element_id,
                        arrow: el.id,
                    }),
                    Some(_) => {}
                }
            }
            for connection in &el.connection_ids {
                if self.connections.by_id(connection).is_none_or(|c| c.is_deleted) {
                    out.push(Violation::StaleBackReference { element: el.id, connection: *connection });
                }
            }
        }
        for conn in self.connections.live() {
            for element in conn.bound_elements() {
                if self.elements.by_id(&element).is_none_or(|el| !el.connection_ids.contains(&conn.id)) {
                    out.push(Violation::MissingBackReference { connection: conn.id, element });
                }
            }
        }
        out
    }
}

fn check_element(el: &Element, out: &mut Vec<Violation>) {
    if el.is_selected && el.is_deleted {
        out.push(Violation::SelectedDeleted(el.id));
    }
    if el.width < 0.0 || el.height < 0.0 {
        out.push(Violation::NegativeExtent(el.id));
    }
    if !(0.0..std::f64::consts::TAU).contains(&el.angle) {
        out.push(Violation::AngleOutOfRange(el.id));
    }
    if let Shape::Freedraw { points } = &el.shape {
        match Rect::envelope(points.iter().copied()) {
            None => out.push(Violation::EmptyFreedraw(el.id)),
            Some(b) => {
                let tol = 1e-6;
                if (b.x - el.x).abs() > tol
                    || (b.y - el.y).abs() > tol
                    || (b.width - el.width).abs() > tol
                    || (b.height - el.height).abs() > tol
                {
                    out.push(Violation::FreedrawEnvelope(el.id));
                }
            }
        }
    }
}
