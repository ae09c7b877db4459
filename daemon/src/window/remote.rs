//! Daemon-side model of the overlay window
//!
//! The native window lives in the UI process. This handle keeps the
//! authoritative visual model and pushes every change to subscribed IPC
//! clients, which apply it to the real window.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{WindowHandle, WindowMover};
use crate::events::{Direction, RendererEvent, WindowCommand};
use crate::ipc::Notification;

#[derive(Debug, Clone, Copy)]
struct Model {
    opacity: f64,
    zoom_level: f64,
    visible: bool,
    click_through: bool,
    destroyed: bool,
}

/// Window handle backed by IPC notifications
pub struct RemoteWindow {
    model: Mutex<Model>,
    notify_tx: broadcast::Sender<Notification>,
}

impl RemoteWindow {
    /// Create a visible window with the given starting opacity
    pub fn new(opacity: f64, notify_tx: broadcast::Sender<Notification>) -> Self {
        Self {
            model: Mutex::new(Model {
                opacity,
                zoom_level: 0.0,
                visible: true,
                click_through: false,
                destroyed: false,
            }),
            notify_tx,
        }
    }

    fn model(&self) -> std::sync::MutexGuard<'_, Model> {
        self.model.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, notification: Notification) {
        if self.model().destroyed {
            debug!(?notification, "window destroyed, dropping notification");
            return;
        }
        // No subscribers is not an error: the UI may not be attached yet
        if self.notify_tx.send(notification).is_err() {
            trace!("no IPC subscribers");
        }
    }

    fn command(&self, command: WindowCommand) {
        self.push(Notification::Window(command));
    }

    /// Mark the window destroyed; later mutations are ignored
    pub fn destroy(&self) {
        self.model().destroyed = true;
    }
}

impl WindowHandle for RemoteWindow {
    fn opacity(&self) -> f64 {
        self.model().opacity
    }

    fn set_opacity(&self, opacity: f64) {
        self.model().opacity = opacity;
        self.command(WindowCommand::SetOpacity { opacity });
    }

    fn show(&self) {
        self.model().visible = true;
        self.command(WindowCommand::Show);
    }

    fn hide(&self) {
        self.model().visible = false;
        self.command(WindowCommand::Hide);
    }

    fn move_to_top(&self) {
        self.command(WindowCommand::MoveToTop);
    }

    fn focus(&self) {
        self.command(WindowCommand::Focus);
    }

    fn is_destroyed(&self) -> bool {
        self.model().destroyed
    }

    fn zoom_level(&self) -> f64 {
        self.model().zoom_level
    }

    fn set_zoom_level(&self, level: f64) {
        self.model().zoom_level = level;
        self.command(WindowCommand::SetZoomLevel { level });
    }

    fn set_click_through(&self, enabled: bool) {
        self.model().click_through = enabled;
        self.command(WindowCommand::SetClickThrough { enabled });
    }

    fn send_to_renderer(&self, event: RendererEvent) {
        self.push(Notification::Renderer(event));
    }
}

impl WindowMover for RemoteWindow {
    fn move_window(&self, direction: Direction) {
        self.command(WindowCommand::Move { direction });
    }
}
