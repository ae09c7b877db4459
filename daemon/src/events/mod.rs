//! Events module for renderer notifications and window commands
//!
//! Provides the structured messages the daemon pushes to the overlay UI:
//! renderer events that drive its views, and window commands it applies
//! to the real window.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Events delivered to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RendererEvent {
    /// A screenshot was captured and queued
    ScreenshotTaken {
        /// Location of the captured image
        path: PathBuf,
        /// data: URL of the image
        preview: String,
    },

    /// Switch back to the queue view
    ResetView,

    /// Drop all renderer-side data
    Reset,

    /// Remove the most recent screenshot from the renderer's queue
    DeleteLastScreenshot,
}

impl std::fmt::Display for RendererEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererEvent::ScreenshotTaken { .. } => write!(f, "screenshot-taken"),
            RendererEvent::ResetView => write!(f, "reset-view"),
            RendererEvent::Reset => write!(f, "reset"),
            RendererEvent::DeleteLastScreenshot => write!(f, "delete-last-screenshot"),
        }
    }
}

/// Direction for window moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Commands the overlay UI applies to its native window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowCommand {
    SetOpacity { opacity: f64 },
    Show,
    Hide,
    MoveToTop,
    Focus,
    SetZoomLevel { level: f64 },
    Move { direction: Direction },
    SetClickThrough { enabled: bool },
}
