//! Shared numeric constants for the canvas crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space half-size of a resize handle hot-zone, in pixels.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the selection's top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

/// Screen-space slop for thin strokes (lines, arrows, freedraw) when hit-testing.
pub const HIT_TOLERANCE_PX: f64 = 4.0;

// ── Shapes ──────────────────────────────────────────────────────

/// Horizontal skew of a rhombus (parallelogram) top edge, as a fraction of its width.
pub const RHOMBUS_SKEW_RATIO: f64 = 0.25;

/// Default size of a freshly placed text box, in world units.
pub const TEXT_DEFAULT_WIDTH: f64 = 200.0;
pub const TEXT_DEFAULT_HEIGHT: f64 = 24.0;

// ── Transforms ──────────────────────────────────────────────────

/// Extents below this are treated as degenerate when computing resize scale.
pub const MIN_EXTENT: f64 = 1e-9;

// ── Presence ────────────────────────────────────────────────────

/// Peers not heard from within this window are pruned.
pub const PRESENCE_STALE_MS: i64 = 3000;

// ── Camera ──────────────────────────────────────────────────────

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
