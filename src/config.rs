//! Desktop configuration.
//!
//! Every layout constant the desktop uses lives in [`DesktopConfig`], which can be loaded from JSON
//! at startup. Missing fields fall back to [`DesktopConfig::default`].
//!
//! ```json
//! {
//!     "container_band_x": 1000,
//!     "container_row_height": 100,
//!     "chat": { "x": 10, "y": 640, "width": 800, "height": 150 }
//! }
//! ```

use crate::color::Color;
use crate::rect::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid desktop config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid desktop config: {field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i32 },
}

/// Serialized form of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectConfig {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<RectConfig> for Rect {
    fn from(r: RectConfig) -> Rect {
        Rect::from_xywh(r.x, r.y, r.width, r.height)
    }
}

/// Layout constants for the desktop and its chrome panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Taskbar height; the taskbar spans the top of the window.
    pub taskbar_height: i32,
    /// Game frame bounds.
    pub frame: RectConfig,
    /// Chat panel bounds.
    pub chat: RectConfig,
    /// Horizontal inset of sidebar windows.
    pub sidebar_window_x: i32,
    /// Vertical positions of the skills, VIP and inventory windows.
    pub sidebar_window_ys: [i32; 3],
    /// Height of each sidebar window.
    pub sidebar_window_height: i32,
    /// Left edge of the band reserved for floating container panels.
    pub container_band_x: i32,
    /// Vertical stacking step between container panels; also their height.
    pub container_row_height: i32,
    /// Width of container panels.
    pub container_width: i32,
    /// Distance of the FPS label from the top right corner.
    pub fps_label_margin: i32,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        DesktopConfig {
            taskbar_height: 18,
            frame: RectConfig {
                x: 10,
                y: 20,
                width: 800,
                height: 600,
            },
            chat: RectConfig {
                x: 10,
                y: 640,
                width: 800,
                height: 150,
            },
            sidebar_window_x: 4,
            sidebar_window_ys: [20, 210, 410],
            sidebar_window_height: 180,
            container_band_x: 1000,
            container_row_height: 100,
            container_width: 170,
            fps_label_margin: 4,
        }
    }
}

impl DesktopConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<DesktopConfig, ConfigError> {
        let config: DesktopConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the fields that must be positive for stacking to make sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("container_row_height", self.container_row_height),
            ("container_width", self.container_width),
            ("sidebar_window_height", self.sidebar_window_height),
        ];
        for &(field, value) in positive.iter() {
            if value <= 0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}

/// A UI skin.
///
/// Only the parts that affect layout and text color are modelled here; sprite sheets are owned by
/// the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skin {
    pub name: String,
    /// Preferred sidebar width.
    pub sidebar_width: i32,
    pub text_color: Color,
    pub panel_color: Color,
}

impl Default for Skin {
    fn default() -> Self {
        Skin {
            name: "default".into(),
            sidebar_width: 176,
            text_color: Color::WHITE,
            panel_color: Color::PANEL,
        }
    }
}
