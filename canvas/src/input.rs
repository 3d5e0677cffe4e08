//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up, carrying everything needed to recompute geometry on each move
//! and commit on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::binding::AnchorCandidate;
use crate::camera::Point;
use crate::doc::{Element, ElementKind};
use crate::hit::ResizeAnchor;
use crate::transform::TransformSnapshot;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Selection,
    Rectangle,
    Ellipse,
    Diamond,
    Rhombus,
    Line,
    /// Draw a directed arrow that binds to the shapes under its endpoints.
    Arrow,
    /// Free-hand stroke.
    Freedraw,
    /// Place a text box and hand it to the text editor.
    Text,
    /// Remove every element the brush passes over.
    Eraser,
}

impl Tool {
    /// The element kind this tool draws, if it draws one.
    #[must_use]
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            Self::Selection | Self::Eraser => None,
            Self::Rectangle => Some(ElementKind::Rectangle),
            Self::Ellipse => Some(ElementKind::Ellipse),
            Self::Diamond => Some(ElementKind::Diamond),
            Self::Rhombus => Some(ElementKind::Rhombus),
            Self::Line => Some(ElementKind::Line),
            Self::Arrow => Some(ElementKind::Arrow),
            Self::Freedraw => Some(ElementKind::Freedraw),
            Self::Text => Some(ElementKind::Text),
        }
    }

    /// Parse a tool name as sent by the host page.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "selection" | "select" => Some(Self::Selection),
            "rectangle" => Some(Self::Rectangle),
            "ellipse" => Some(Self::Ellipse),
            "diamond" => Some(Self::Diamond),
            "rhombus" => Some(Self::Rhombus),
            "line" => Some(Self::Line),
            "arrow" => Some(Self::Arrow),
            "freedraw" | "pen" => Some(Self::Freedraw),
            "text" => Some(Self::Text),
            "eraser" => Some(Self::Eraser),
            _ => None,
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active drawing tool.
    pub tool: Tool,
    /// Element under the pointer while hover-highlighting applies.
    pub hover: Option<AnchorCandidate>,
    /// Start-anchor candidate captured at pointer-down with the arrow tool.
    pub arrow_start: Option<AnchorCandidate>,
    /// End-anchor candidate tracked while an arrow is being drawn.
    pub arrow_end: Option<AnchorCandidate>,
}

impl UiState {
    /// Drop every hover and anchor candidate.
    pub fn clear_anchors(&mut self) {
        self.hover = None;
        self.arrow_start = None;
        self.arrow_end = None;
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries the gesture context needed to recompute
/// geometry on move and emit final actions on pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A new element is being sized; it joins the scene on release.
    DrawingNewElement {
        /// The in-progress element, not yet in the store.
        element: Element,
        /// World-space pointer position at pointer-down.
        start: Point,
    },
    /// The selection is being resized by one of its eight handles.
    ResizingSelection {
        anchor: ResizeAnchor,
        /// World-space pointer position at the start of the resize.
        start: Point,
        snapshot: TransformSnapshot,
    },
    /// The selection is being rotated about its combined centre.
    RotatingSelection {
        /// World-space pointer position when the rotate handle was grabbed.
        rotation_start: Point,
        snapshot: TransformSnapshot,
    },
    /// The selection is being dragged.
    TranslatingSelection {
        /// World-space pointer position at pointer-down.
        start: Point,
        snapshot: TransformSnapshot,
    },
    /// A marquee box is being dragged out from `anchor`.
    MarqueeSelecting { anchor: Point, current: Point },
    /// The eraser brush is down; touched elements are flagged for removal.
    ErasingBrush,
}

impl InputState {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrawingNewElement { .. } => "drawing",
            Self::ResizingSelection { .. } => "resizing",
            Self::RotatingSelection { .. } => "rotating",
            Self::TranslatingSelection { .. } => "translating",
            Self::MarqueeSelecting { .. } => "marquee",
            Self::ErasingBrush => "erasing",
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
