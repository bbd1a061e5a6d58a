//! Computer-use surface consumed by the serial computer-action executor.
//!
//! A [`Computer`] is one shared mutable surface (a browser, a VM desktop).
//! Every method mutates that surface, so the engine only ever drives it
//! from the serial sub-step of the tool executor — never concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// The kind of environment a computer surface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// A macOS desktop.
    Mac,
    /// A Windows desktop.
    Windows,
    /// A Linux desktop.
    Ubuntu,
    /// A browser tab.
    Browser,
}

/// Mouse button for click actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Primary button.
    #[default]
    Left,
    /// Secondary button.
    Right,
    /// Scroll wheel button.
    Wheel,
    /// Browser back button.
    Back,
    /// Browser forward button.
    Forward,
}

/// A point on the computer surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in pixels.
    pub x: i64,
    /// Vertical coordinate in pixels.
    pub y: i64,
}

/// One action requested by the model against the computer surface.
///
/// Actions are executed strictly serially, in request order; each action's
/// handler takes a screenshot after performing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ComputerAction {
    /// Click at a position.
    Click {
        /// Horizontal coordinate in pixels.
        x: i64,
        /// Vertical coordinate in pixels.
        y: i64,
        /// Which button to click.
        #[serde(default)]
        button: MouseButton,
    },
    /// Double-click at a position.
    DoubleClick {
        /// Horizontal coordinate in pixels.
        x: i64,
        /// Vertical coordinate in pixels.
        y: i64,
    },
    /// Drag along a path of points.
    Drag {
        /// The path to drag along, in order.
        path: Vec<Point>,
    },
    /// Press a key combination.
    Keypress {
        /// Keys to press together (e.g. `["ctrl", "c"]`).
        keys: Vec<String>,
    },
    /// Move the pointer to a position.
    Move {
        /// Horizontal coordinate in pixels.
        x: i64,
        /// Vertical coordinate in pixels.
        y: i64,
    },
    /// Take a screenshot.
    Screenshot,
    /// Scroll from a position.
    Scroll {
        /// Pointer x position.
        x: i64,
        /// Pointer y position.
        y: i64,
        /// Horizontal scroll delta.
        scroll_x: i64,
        /// Vertical scroll delta.
        scroll_y: i64,
    },
    /// Type a string of text.
    Type {
        /// The text to type.
        text: String,
    },
    /// Wait briefly for the surface to settle.
    Wait,
}

impl ComputerAction {
    /// A short name for the action kind, used in tracing.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::DoubleClick { .. } => "double_click",
            Self::Drag { .. } => "drag",
            Self::Keypress { .. } => "keypress",
            Self::Move { .. } => "move",
            Self::Screenshot => "screenshot",
            Self::Scroll { .. } => "scroll",
            Self::Type { .. } => "type",
            Self::Wait => "wait",
        }
    }
}

/// A controllable computer surface.
///
/// Implementations are external to this crate (a headless browser, a VNC
/// session). All methods mutate shared state and are only safe under serial
/// access; the engine guarantees that.
#[async_trait]
pub trait Computer: Send + Sync {
    /// The environment this surface exposes.
    fn environment(&self) -> Environment;

    /// Surface dimensions as `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Capture the current screen as a base64-encoded PNG.
    async fn screenshot(&self) -> Result<String, ToolError>;

    /// Click at a position.
    async fn click(&self, x: i64, y: i64, button: MouseButton) -> Result<(), ToolError>;

    /// Double-click at a position.
    async fn double_click(&self, x: i64, y: i64) -> Result<(), ToolError>;

    /// Drag along a path of points.
    async fn drag(&self, path: &[Point]) -> Result<(), ToolError>;

    /// Press a key combination.
    async fn keypress(&self, keys: &[String]) -> Result<(), ToolError>;

    /// Move the pointer to a position.
    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), ToolError>;

    /// Scroll from a position by the given deltas.
    async fn scroll(&self, x: i64, y: i64, scroll_x: i64, scroll_y: i64)
    -> Result<(), ToolError>;

    /// Type a string of text.
    async fn type_text(&self, text: &str) -> Result<(), ToolError>;

    /// Wait briefly for the surface to settle.
    async fn wait(&self) -> Result<(), ToolError>;
}

/// A shared, thread-safe [`Computer`] trait object.
pub type SharedComputer = Arc<dyn Computer>;
