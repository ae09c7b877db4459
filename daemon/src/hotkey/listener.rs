//! Global hotkey listener using macOS CGEventTap
//!
//! Monitors system-wide key-down events and reports every chord that
//! carries at least one modifier. Runs on a dedicated thread with its own
//! CFRunLoop. Other platforms have no listener backend; chords can still
//! arrive over IPC.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::HotkeyError;
use super::keys::Chord;

/// Events sent from the hotkey listener to the dispatcher
#[derive(Debug, Clone)]
pub enum HotkeyEvent {
    /// A chord was pressed
    Pressed(Chord),
    /// Event tap was disabled by macOS (needs re-registration)
    TapDisabled,
}

/// Global hotkey listener that reports chord presses
pub struct HotkeyListener {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    event_tx: mpsc::Sender<HotkeyEvent>,
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    /// Create a new hotkey listener
    pub fn new(event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self {
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the hotkey listener
    ///
    /// This spawns a dedicated thread that runs a CFRunLoop to receive
    /// CGEventTap callbacks. The listener runs until `stop()` is called
    /// or the program exits.
    #[cfg(target_os = "macos")]
    pub fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        std::thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                tracing::info!("hotkey listener thread started");

                if let Err(e) = macos::run_event_loop(event_tx, running.clone()) {
                    tracing::error!(?e, "hotkey listener error");
                }

                running.store(false, Ordering::SeqCst);
                tracing::info!("hotkey listener thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                HotkeyError::ThreadSpawn(e.to_string())
            })?;

        Ok(())
    }

    /// Start the hotkey listener
    #[cfg(not(target_os = "macos"))]
    pub fn start(&self) -> Result<(), HotkeyError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }
        tracing::warn!("no global hotkey backend for this platform");
        Err(HotkeyError::Unsupported)
    }

    /// Stop the hotkey listener
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        // The CFRunLoop will exit on the next iteration
        #[cfg(target_os = "macos")]
        core_foundation::runloop::CFRunLoop::get_main().stop();
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
    use core_graphics::event::{
        CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
        CGEventTapPlacement, CGEventType, EventField,
    };
    use tokio::sync::mpsc;
    use tracing::{debug, error, info, warn};

    use super::{HotkeyError, HotkeyEvent};
    use crate::hotkey::keys::{Chord, Key, ModifierState};

    /// Raw tap output handed from the callback to the loop
    enum Raw {
        KeyDown(CGEventFlags, i64),
        Disabled,
    }

    /// Run the CFRunLoop with the event tap
    pub(super) fn run_event_loop(
        event_tx: mpsc::Sender<HotkeyEvent>,
        running: Arc<AtomicBool>,
    ) -> Result<(), HotkeyError> {
        let (callback_tx, callback_rx) = std::sync::mpsc::channel::<Raw>();

        // CGEventTap callback - must be fast and non-blocking
        let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                             event_type: CGEventType,
                             event: &CGEvent|
              -> Option<CGEvent> {
            match event_type {
                CGEventType::KeyDown => {
                    let repeat =
                        event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT);
                    if repeat == 0 {
                        let keycode =
                            event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE);
                        let _ = callback_tx.send(Raw::KeyDown(event.get_flags(), keycode));
                    }
                }
                CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                    let _ = callback_tx.send(Raw::Disabled);
                }
                _ => {}
            }
            Some(event.clone())
        };

        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::ListenOnly,
            vec![CGEventType::KeyDown],
            callback,
        )
        .map_err(|_| {
            error!("failed to create event tap - is Accessibility permission granted?");
            HotkeyError::EventTapCreation
        })?;

        tap.enable();

        let run_loop_source = tap
            .mach_port
            .create_runloop_source(0)
            .map_err(|_| HotkeyError::EventTapCreation)?;
        let run_loop = CFRunLoop::get_current();

        unsafe {
            run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
        }

        info!("event tap created and enabled");

        while running.load(Ordering::SeqCst) {
            unsafe {
                CFRunLoop::run_in_mode(
                    kCFRunLoopDefaultMode,
                    std::time::Duration::from_millis(100),
                    true,
                );
            }

            while let Ok(raw) = callback_rx.try_recv() {
                let event = match raw {
                    Raw::KeyDown(flags, keycode) => {
                        let modifiers = ModifierState::from_flags(flags);
                        let Some(key) = Key::from_mac_keycode(keycode) else {
                            continue;
                        };
                        if modifiers.is_empty() {
                            continue;
                        }
                        let chord = Chord::new(modifiers, key);
                        debug!(%chord, "chord pressed");
                        HotkeyEvent::Pressed(chord)
                    }
                    Raw::Disabled => {
                        warn!("event tap disabled, re-enabling");
                        tap.enable();
                        HotkeyEvent::TapDisabled
                    }
                };

                // We use blocking_send since we're not in an async context
                if event_tx.blocking_send(event).is_err() {
                    warn!("failed to send hotkey event - channel closed?");
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }

        Ok(())
    }
}
