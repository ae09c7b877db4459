//! Hotkey dispatcher
//!
//! Registers the binding table with the shortcut registry, routes chord
//! presses to handlers, and tears everything down on quit.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::actions::{Action, Binding};
use super::handlers::{self, Context, ZOOM_STEP};
use crate::events::Direction;
use crate::hotkey::{Chord, HotkeyError, HotkeyEvent, ShortcutRegistry};
use crate::state::OPACITY_STEP;

/// Registration lifecycle of the binding table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Nothing registered yet
    Pending,
    /// Table registered, chords are live
    Registered,
    /// Unregistered on quit; terminal
    TornDown,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifecycle::Pending => write!(f, "Pending"),
            Lifecycle::Registered => write!(f, "Registered"),
            Lifecycle::TornDown => write!(f, "TornDown"),
        }
    }
}

/// Routes global chords to their actions
pub struct HotkeyDispatcher {
    registry: Arc<ShortcutRegistry>,
    bindings: Vec<Binding>,
    context: Context,
    lifecycle: Mutex<Lifecycle>,
}

impl HotkeyDispatcher {
    pub fn new(registry: Arc<ShortcutRegistry>, bindings: Vec<Binding>, context: Context) -> Self {
        Self {
            registry,
            bindings,
            context,
            lifecycle: Mutex::new(Lifecycle::Pending),
        }
    }

    fn lifecycle_guard(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current lifecycle stage
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle_guard()
    }

    /// Register the whole table in one pass.
    ///
    /// Either every binding is registered or none is. A second call while
    /// registered changes nothing and returns `Ok(0)`; a call after
    /// `unregister_all` fails.
    pub fn register_all(&self) -> Result<usize, HotkeyError> {
        let mut lifecycle = self.lifecycle_guard();
        match *lifecycle {
            Lifecycle::Registered => {
                warn!("shortcuts already registered, ignoring");
                return Ok(0);
            }
            Lifecycle::TornDown => return Err(HotkeyError::TornDown),
            Lifecycle::Pending => {}
        }

        let mut seen = HashSet::new();
        for binding in &self.bindings {
            if !seen.insert(binding.chord) {
                return Err(HotkeyError::DuplicateChord(binding.chord));
            }
            if self.registry.is_registered(&binding.chord) {
                return Err(HotkeyError::AlreadyRegistered(binding.chord));
            }
        }

        for binding in &self.bindings {
            self.registry.register(binding.chord, binding.action)?;
        }

        *lifecycle = Lifecycle::Registered;
        info!(count = self.bindings.len(), "global shortcuts registered");
        Ok(self.bindings.len())
    }

    /// Remove every binding. After this no chord triggers anything.
    pub fn unregister_all(&self) {
        let mut lifecycle = self.lifecycle_guard();
        if *lifecycle == Lifecycle::TornDown {
            debug!("shortcuts already unregistered");
            return;
        }
        self.registry.unregister_all();
        info!(from = %*lifecycle, "global shortcuts torn down");
        *lifecycle = Lifecycle::TornDown;
    }

    /// Handle a chord press. Returns the action it triggered, if any.
    pub fn fire(&self, chord: &Chord) -> Option<Action> {
        let Some(action) = self.registry.lookup(chord) else {
            debug!(%chord, "unbound chord");
            return None;
        };

        info!(%chord, ?action, "hotkey fired");
        // Detached: async handlers must not block later presses
        let _ = self.dispatch(action);
        Some(action)
    }

    /// Run an action. Synchronous actions complete before this returns;
    /// asynchronous ones are spawned and their handle returned. Without a
    /// runtime, asynchronous actions are skipped.
    pub fn dispatch(&self, action: Action) -> Option<JoinHandle<()>> {
        let ctx = &self.context;
        match action {
            Action::CaptureScreenshot => {
                return spawn_handler(action, handlers::capture_screenshot(ctx.clone()));
            }
            Action::ProcessScreenshots => {
                return spawn_handler(action, handlers::process_screenshots(ctx.clone()));
            }
            Action::CancelAndReset => handlers::cancel_and_reset(ctx),
            Action::MoveLeft => handlers::move_window(ctx, Direction::Left),
            Action::MoveRight => handlers::move_window(ctx, Direction::Right),
            Action::MoveUp => handlers::move_window(ctx, Direction::Up),
            Action::MoveDown => handlers::move_window(ctx, Direction::Down),
            Action::ToggleVisibility => ctx.toggles.toggle_main_window(),
            Action::Quit => {
                info!("quitting application");
                ctx.app.quit();
            }
            Action::OpacityDown => {
                ctx.visibility.adjust_opacity(-OPACITY_STEP);
            }
            Action::OpacityUp => {
                ctx.visibility.adjust_opacity(OPACITY_STEP);
            }
            Action::ZoomOut => handlers::zoom_by(ctx, -ZOOM_STEP),
            Action::ZoomIn => handlers::zoom_by(ctx, ZOOM_STEP),
            Action::ZoomReset => handlers::reset_zoom(ctx),
            Action::DeleteLastScreenshot => handlers::delete_last_screenshot(ctx),
            Action::ToggleClickThrough => ctx.toggles.toggle_click_through(),
            Action::EmergencyShow => {
                ctx.visibility.emergency_show();
            }
            Action::ForceShow => {
                ctx.visibility.force_show_window();
            }
        }
        None
    }

    /// Process hotkey events until the channel closes
    pub async fn run(&self, mut hotkey_rx: mpsc::Receiver<HotkeyEvent>) {
        info!("dispatcher started");

        while let Some(event) = hotkey_rx.recv().await {
            match event {
                HotkeyEvent::Pressed(chord) => {
                    self.fire(&chord);
                }
                HotkeyEvent::TapDisabled => {
                    warn!("hotkey tap disabled, events may be missed");
                }
            }
        }

        info!("dispatcher stopped");
    }
}

fn spawn_handler<F>(action: Action, task: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(task)),
        Err(_) => {
            warn!(?action, "no async runtime, skipping action");
            None
        }
    }
}
