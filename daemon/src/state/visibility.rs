//! Opacity and visibility state machine
//!
//! Single authority for hotkey-driven opacity and visibility changes.
//! After every mutating call the window is shown and the shared visibility
//! flag is set whenever the resulting opacity is above the floor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::app_state::AppState;
use crate::config::{ConfigStore, MAX_OPACITY, MIN_OPACITY};
use crate::window::{MainWindow, VisibilityToggle, WindowHandle};

/// Opacity change per hotkey press
pub const OPACITY_STEP: f64 = 0.1;

/// Below this opacity any increase jumps straight to fully opaque
pub const RECOVERY_THRESHOLD: f64 = 0.3;

/// Delay between show/raise and the focus request
pub const FOCUS_DELAY: Duration = Duration::from_millis(50);

/// Compute the opacity an adjustment lands on.
///
/// Increasing from a near-invisible window snaps to full opacity; every
/// other change is clamped to `[MIN_OPACITY, MAX_OPACITY]`. Non-finite
/// input still yields a value in range.
pub fn next_opacity(current: f64, delta: f64) -> f64 {
    if current < RECOVERY_THRESHOLD && delta > 0.0 {
        MAX_OPACITY
    } else {
        // f64::max/min drop NaN operands, unlike clamp
        (current + delta).max(MIN_OPACITY).min(MAX_OPACITY)
    }
}

/// Owns the window's opacity and visibility transitions
pub struct VisibilityController {
    window: MainWindow,
    config: Arc<dyn ConfigStore>,
    state: Arc<AppState>,
    /// Opacity to restore when a hidden window is shown again
    hidden_opacity: Mutex<Option<f64>>,
}

impl VisibilityController {
    pub fn new(window: MainWindow, config: Arc<dyn ConfigStore>, state: Arc<AppState>) -> Self {
        Self {
            window,
            config,
            state,
            hidden_opacity: Mutex::new(None),
        }
    }

    /// Nudge the window opacity by `delta`.
    ///
    /// Returns the applied opacity, or `None` when no window exists.
    pub fn adjust_opacity(&self, delta: f64) -> Option<f64> {
        let Some(window) = self.window.get() else {
            debug!(delta, "no window, ignoring opacity adjustment");
            return None;
        };

        let current = window.opacity();
        let new_opacity = next_opacity(current, delta);
        if current < RECOVERY_THRESHOLD && delta > 0.0 {
            info!(current, "low opacity detected, jumping to full opacity");
        }
        info!(from = current, to = new_opacity, "adjusting opacity");

        window.set_opacity(new_opacity);
        self.persist(new_opacity);

        if new_opacity > MIN_OPACITY {
            window.show();
            window.move_to_top();
            schedule_focus(window);
            self.take_hidden_opacity();
            self.state.set_window_visible(true);
        }

        Some(new_opacity)
    }

    /// Make the window fully opaque, shown, raised and focused right now.
    ///
    /// Returns `false` when no window exists.
    pub fn force_show_window(&self) -> bool {
        let Some(window) = self.window.get() else {
            debug!("no window to show");
            return false;
        };

        window.set_opacity(MAX_OPACITY);
        window.show();
        window.move_to_top();
        window.focus();
        self.take_hidden_opacity();
        self.state.set_window_visible(true);
        self.persist(MAX_OPACITY);

        info!("window forced visible");
        true
    }

    /// Escape hatch for a window stuck invisible or unfocused
    pub fn emergency_show(&self) -> bool {
        warn!("emergency visibility requested");
        self.force_show_window()
    }

    fn persist(&self, opacity: f64) {
        if let Err(e) = self.config.set_opacity(opacity) {
            warn!(?e, opacity, "failed to persist opacity");
        }
    }

    fn take_hidden_opacity(&self) -> Option<f64> {
        self.hidden_opacity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn hide(&self, window: &dyn WindowHandle) {
        let opacity = window.opacity();
        *self
            .hidden_opacity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(opacity);

        window.set_opacity(0.0);
        window.hide();
        self.state.set_window_visible(false);
        info!(restore = opacity, "window hidden");
    }

    fn show(&self, window: &dyn WindowHandle) {
        let opacity = self
            .take_hidden_opacity()
            .unwrap_or_else(|| window.opacity())
            .max(MIN_OPACITY)
            .min(MAX_OPACITY);

        window.set_opacity(opacity);
        window.show();
        window.move_to_top();
        window.focus();
        self.state.set_window_visible(true);
        info!(opacity, "window shown");
    }
}

impl VisibilityToggle for VisibilityController {
    fn toggle_main_window(&self) {
        let Some(window) = self.window.get() else {
            debug!("no window to toggle");
            return;
        };

        if self.state.is_window_visible() {
            self.hide(window.as_ref());
        } else {
            self.show(window.as_ref());
        }
    }

    fn toggle_click_through(&self) {
        let Some(window) = self.window.get() else {
            debug!("no window for click-through");
            return;
        };

        let enabled = !self.state.is_click_through();
        window.set_click_through(enabled);
        self.state.set_click_through(enabled);
        info!(enabled, "click-through toggled");
    }
}

/// Request focus shortly after a show/raise, unless the window is gone by then
fn schedule_focus(window: Arc<dyn WindowHandle>) {
    let task = async move {
        tokio::time::sleep(FOCUS_DELAY).await;
        if window.is_destroyed() {
            debug!("window destroyed before deferred focus");
            return;
        }
        window.focus();
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => warn!("no async runtime, skipping deferred focus"),
    }
}
