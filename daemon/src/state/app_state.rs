//! Process-wide application state record
//!
//! Shared by reference with every component that needs to query it.
//! Visibility and click-through are written only by the
//! `VisibilityController`; the view is written through `ViewStateStore`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::services::ViewStateStore;

/// Top-level view shown by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Screenshot queue (default)
    #[default]
    Queue,
    /// Processed results
    Solutions,
    /// Follow-up screenshots for a result
    Debug,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Queue => write!(f, "queue"),
            View::Solutions => write!(f, "solutions"),
            View::Debug => write!(f, "debug"),
        }
    }
}

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    window_visible: AtomicBool,
    click_through: AtomicBool,
    view: Mutex<View>,
}

impl AppState {
    /// State at startup: window visible, mouse events captured, queue view
    pub fn new() -> Self {
        Self {
            window_visible: AtomicBool::new(true),
            click_through: AtomicBool::new(false),
            view: Mutex::new(View::Queue),
        }
    }

    pub fn is_window_visible(&self) -> bool {
        self.window_visible.load(Ordering::SeqCst)
    }

    pub(super) fn set_window_visible(&self, visible: bool) {
        self.window_visible.store(visible, Ordering::SeqCst);
    }

    pub fn is_click_through(&self) -> bool {
        self.click_through.load(Ordering::SeqCst)
    }

    pub(super) fn set_click_through(&self, enabled: bool) {
        self.click_through.store(enabled, Ordering::SeqCst);
    }

    pub fn view(&self) -> View {
        *self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStateStore for AppState {
    fn set_view(&self, view: View) {
        let mut current = self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != view {
            info!(from = %*current, to = %view, "view changed");
        }
        *current = view;
    }
}
