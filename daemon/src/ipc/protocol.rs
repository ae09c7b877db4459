//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::dispatch::Action;
use crate::events::{RendererEvent, WindowCommand};
use crate::state::View;

/// Largest accepted frame body
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to window commands and renderer events
    Subscribe,

    /// Fire a registered chord as if it had been pressed
    Trigger { chord: String },
}

/// Responses from daemon to UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Chord accepted for dispatch
    Triggered { action: Action },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    /// Event for the renderer
    Renderer(RendererEvent),
    /// Command for the native window
    Window(WindowCommand),
}

/// Everything written to a client socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Frame {
    Response(Response),
    Notification(Notification),
}

/// Full daemon status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Window opacity, if a window exists
    pub opacity: Option<f64>,

    /// Shared visibility flag
    pub window_visible: bool,

    /// Whether the window ignores mouse events
    pub click_through: bool,

    /// Current renderer view
    pub view: View,

    /// Window zoom level, if a window exists
    pub zoom_level: Option<f64>,

    /// Number of live global shortcuts
    pub bindings: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            opacity: None,
            window_visible: false,
            click_through: false,
            view: View::default(),
            zoom_level: None,
            bindings: 0,
            uptime_secs: 0,
        }
    }
}
