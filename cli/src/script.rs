//! Recorded gesture scripts: a JSON array of pointer and tool steps replayed
//! through [`EngineCore`] exactly as a browser host would deliver them.
//!
//! ```json
//! [
//!   { "op": "tool", "tool": "rectangle" },
//!   { "op": "down", "x": 10, "y": 10 },
//!   { "op": "move", "x": 60, "y": 40 },
//!   { "op": "up", "x": 60, "y": 40 }
//! ]
//! ```

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use canvas::camera::Point;
use canvas::doc::ElementId;
use canvas::engine::{Action, EngineCore};
use canvas::input::{Button, Modifiers, Tool};
use serde::Deserialize;
use tracing::debug;

/// One recorded input event. Coordinates are screen-space CSS pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Tool {
        tool: Tool,
    },
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Leave {
        x: f64,
        y: f64,
    },
    #[serde(rename = "dblclick")]
    DoubleClick {
        x: f64,
        y: f64,
    },
    /// Answer the most recent text-edit request.
    Text {
        text: String,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    Zoom {
        x: f64,
        y: f64,
        factor: f64,
    },
}

/// Parse a script document.
///
/// # Errors
///
/// Returns the decode error for malformed JSON or unknown steps.
pub fn parse(raw: &str) -> Result<Vec<Step>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Feed every step to `core`, returning all emitted actions in order.
///
/// `text` steps go to the element named by the latest `EditTextRequested`;
/// with no such request they are skipped.
pub fn replay(core: &mut EngineCore, steps: &[Step]) -> Vec<Action> {
    let mut log = Vec::new();
    let mut editing: Option<ElementId> = None;
    for (index, step) in steps.iter().enumerate() {
        let actions = match step {
            Step::Tool { tool } => {
                core.set_tool(*tool);
                Vec::new()
            }
            Step::Down { x, y, button, modifiers } => core.on_pointer_down(Point::new(*x, *y), *button, *modifiers),
            Step::Move { x, y, modifiers } => core.on_pointer_move(Point::new(*x, *y), *modifiers),
            Step::Up { x, y, button, modifiers } => core.on_pointer_up(Point::new(*x, *y), *button, *modifiers),
            Step::Leave { x, y } => core.on_pointer_leave(Point::new(*x, *y)),
            Step::DoubleClick { x, y } => core.on_double_click(Point::new(*x, *y)),
            Step::Text { text } => match editing {
                Some(id) => core.set_text(&id, text.clone()),
                None => {
                    debug!(step = index, "no pending text edit");
                    Vec::new()
                }
            },
            Step::Pan { dx, dy } => core.pan_by(*dx, *dy),
            Step::Zoom { x, y, factor } => core.zoom_at(Point::new(*x, *y), *factor),
        };
        for action in &actions {
            debug!(step = index, action = ?action, "action");
            if let Action::EditTextRequested { id } = action {
                editing = Some(*id);
            }
        }
        log.extend(actions);
    }
    log
}
