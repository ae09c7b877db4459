//! Window abstractions consumed by the controller and the dispatcher

mod remote;

use std::sync::{Arc, RwLock};

use crate::events::{Direction, RendererEvent};

pub use remote::RemoteWindow;

/// Handle to the overlay window
pub trait WindowHandle: Send + Sync {
    fn opacity(&self) -> f64;
    fn set_opacity(&self, opacity: f64);
    fn show(&self);
    fn hide(&self);
    fn move_to_top(&self);
    fn focus(&self);
    fn is_destroyed(&self) -> bool;
    fn zoom_level(&self) -> f64;
    fn set_zoom_level(&self, level: f64);
    fn set_click_through(&self, enabled: bool);
    fn send_to_renderer(&self, event: RendererEvent);
}

/// Moves the window around the screen
pub trait WindowMover: Send + Sync {
    fn move_window(&self, direction: Direction);
}

/// Visibility and click-through toggles
pub trait VisibilityToggle: Send + Sync {
    fn toggle_main_window(&self);
    fn toggle_click_through(&self);
}

/// Slot for the main window, empty until a window exists
#[derive(Clone, Default)]
pub struct MainWindow {
    inner: Arc<RwLock<Option<Arc<dyn WindowHandle>>>>,
}

impl MainWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(window: Arc<dyn WindowHandle>) -> Self {
        let slot = Self::new();
        slot.set(window);
        slot
    }

    /// Current window handle, if one exists
    pub fn get(&self) -> Option<Arc<dyn WindowHandle>> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, window: Arc<dyn WindowHandle>) {
        *self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(window);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
