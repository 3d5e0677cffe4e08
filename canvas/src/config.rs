//! Engine tunables, loaded from defaults, a JSON document, or the environment.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    HANDLE_RADIUS_PX, HIT_TOLERANCE_PX, PRESENCE_STALE_MS, ROTATE_HANDLE_OFFSET_PX, TEXT_DEFAULT_HEIGHT,
    TEXT_DEFAULT_WIDTH,
};
use crate::doc::Style;

pub const ENV_HANDLE_RADIUS_PX: &str = "INKBOARD_HANDLE_RADIUS_PX";
pub const ENV_ROTATE_HANDLE_OFFSET_PX: &str = "INKBOARD_ROTATE_HANDLE_OFFSET_PX";
pub const ENV_HIT_TOLERANCE_PX: &str = "INKBOARD_HIT_TOLERANCE_PX";
pub const ENV_PRESENCE_STALE_MS: &str = "INKBOARD_PRESENCE_STALE_MS";

/// Errors raised while loading a [`CanvasConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config value {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    /// Half-size of a resize handle hot-zone, in screen pixels.
    pub handle_radius_px: f64,
    /// Gap between the selection's top edge and the rotate handle, in screen pixels.
    pub rotate_handle_offset_px: f64,
    /// Slop around thin strokes when hit-testing, in screen pixels.
    pub hit_tolerance_px: f64,
    pub text_default_width: f64,
    pub text_default_height: f64,
    /// Peers silent for longer than this are pruned.
    pub presence_stale_ms: i64,
    /// Style given to newly drawn elements.
    pub default_style: Style,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            handle_radius_px: HANDLE_RADIUS_PX,
            rotate_handle_offset_px: ROTATE_HANDLE_OFFSET_PX,
            hit_tolerance_px: HIT_TOLERANCE_PX,
            text_default_width: TEXT_DEFAULT_WIDTH,
            text_default_height: TEXT_DEFAULT_HEIGHT,
            presence_stale_ms: PRESENCE_STALE_MS,
            default_style: Style::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a JSON document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for negative or non-finite sizes.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    ///
    /// Optional:
    /// - `INKBOARD_HANDLE_RADIUS_PX`: default 8
    /// - `INKBOARD_ROTATE_HANDLE_OFFSET_PX`: default 24
    /// - `INKBOARD_HIT_TOLERANCE_PX`: default 4
    /// - `INKBOARD_PRESENCE_STALE_MS`: default 3000
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay any set environment variables; unparsable values are ignored.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env_lookup)
    }

    /// Overlay values from an arbitrary lookup (the environment, in production).
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.handle_radius_px = parse_or(&lookup, ENV_HANDLE_RADIUS_PX, self.handle_radius_px);
        self.rotate_handle_offset_px = parse_or(&lookup, ENV_ROTATE_HANDLE_OFFSET_PX, self.rotate_handle_offset_px);
        self.hit_tolerance_px = parse_or(&lookup, ENV_HIT_TOLERANCE_PX, self.hit_tolerance_px);
        self.presence_stale_ms = parse_or(&lookup, ENV_PRESENCE_STALE_MS, self.presence_stale_ms);
        self
    }

    /// Reject negative or non-finite sizes.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("handleRadiusPx", self.handle_radius_px),
            ("rotateHandleOffsetPx", self.rotate_handle_offset_px),
            ("hitTolerancePx", self.hit_tolerance_px),
            ("textDefaultWidth", self.text_default_width),
            ("textDefaultHeight", self.text_default_height),
        ];
        for (field, value) in sizes {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.presence_stale_ms < 0 {
            #[allow(clippy::cast_precision_loss)]
            let value = self.presence_stale_ms as f64;
            return Err(ConfigError::OutOfRange { field: "presenceStaleMs", value });
        }
        Ok(())
    }
}

/// Read one override from the process environment.
fn env_lookup(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) => Some(value),
        Err(std::env::VarError::NotPresent) => None,
        Err(e) => {
            warn!(key, error = %e, "ignoring environment override");
            None
        }
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key).map(|raw| raw.trim().parse::<T>()) {
        Some(Ok(value)) => value,
        _ => default,
    }
}
