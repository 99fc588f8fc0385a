//! Input tuning for mouse and touch operation.
//!
//! Touch input needs larger hit targets and more movement slop than a mouse.
//! Rather than reading a global "touch mode" flag, the controller is built
//! with an [`InputModeConfig`] and every threshold it uses comes from there.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gesture::GestureConfig;

pub const DEFAULT_MOUSE_HITBOX: f64 = 8.0;
pub const DEFAULT_TOUCH_HITBOX: f64 = 20.0;
pub const DEFAULT_MOUSE_DRAG_THRESHOLD: f64 = 3.0;
pub const DEFAULT_TOUCH_DRAG_THRESHOLD: f64 = 10.0;
pub const DEFAULT_MIN_SWIPE_DISTANCE: f64 = 50.0;
pub const DEFAULT_MAX_SWIPE_TIME_MS: f64 = 300.0;
pub const DEFAULT_LONG_PRESS_DELAY_MS: f64 = 500.0;
pub const DEFAULT_DOUBLE_TAP_DELAY_MS: f64 = 300.0;
pub const DEFAULT_DOUBLE_TAP_SLOP: f64 = 30.0;
pub const DEFAULT_WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

/// Thresholds and hit sizes for one input style. All distances are screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputModeConfig {
    /// Half-size of a resize handle's hit area.
    pub hitbox_size: f64,
    /// Movement beyond which a press becomes a drag (and stops being a tap or long-press).
    pub drag_threshold: f64,
    pub min_swipe_distance: f64,
    pub max_swipe_time_ms: f64,
    pub long_press_delay_ms: f64,
    pub double_tap_delay_ms: f64,
    /// Greatest distance between two taps that still counts as the same point.
    pub double_tap_slop: f64,
    /// Zoom change per pixel of ctrl-wheel scroll.
    pub wheel_zoom_sensitivity: f64,
}

impl Default for InputModeConfig {
    fn default() -> Self {
        Self {
            hitbox_size: DEFAULT_MOUSE_HITBOX,
            drag_threshold: DEFAULT_MOUSE_DRAG_THRESHOLD,
            min_swipe_distance: DEFAULT_MIN_SWIPE_DISTANCE,
            max_swipe_time_ms: DEFAULT_MAX_SWIPE_TIME_MS,
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            double_tap_delay_ms: DEFAULT_DOUBLE_TAP_DELAY_MS,
            double_tap_slop: DEFAULT_DOUBLE_TAP_SLOP,
            wheel_zoom_sensitivity: DEFAULT_WHEEL_ZOOM_SENSITIVITY,
        }
    }
}

impl InputModeConfig {
    /// Preset for finger input: larger handles and more movement slop.
    #[must_use]
    pub fn touch() -> Self {
        Self {
            hitbox_size: DEFAULT_TOUCH_HITBOX,
            drag_threshold: DEFAULT_TOUCH_DRAG_THRESHOLD,
            ..Self::default()
        }
    }

    /// Parse a JSON config; absent fields take their mouse-preset defaults.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON and `Invalid` for non-positive values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is a positive finite number.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("hitbox_size", self.hitbox_size),
            ("drag_threshold", self.drag_threshold),
            ("min_swipe_distance", self.min_swipe_distance),
            ("max_swipe_time_ms", self.max_swipe_time_ms),
            ("long_press_delay_ms", self.long_press_delay_ms),
            ("double_tap_delay_ms", self.double_tap_delay_ms),
            ("double_tap_slop", self.double_tap_slop),
            ("wheel_zoom_sensitivity", self.wheel_zoom_sensitivity),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid { field, reason: format!("must be positive, got {value}") });
            }
        }
        Ok(())
    }

    /// The subset of thresholds used by the gesture recognizer.
    #[must_use]
    pub fn gesture(&self) -> GestureConfig {
        GestureConfig {
            min_swipe_distance: self.min_swipe_distance,
            max_swipe_time_ms: self.max_swipe_time_ms,
            long_press_delay_ms: self.long_press_delay_ms,
            double_tap_delay_ms: self.double_tap_delay_ms,
            double_tap_slop: self.double_tap_slop,
            drag_threshold: self.drag_threshold,
        }
    }
}
