//! overlay-daemon: Hotkey dispatcher for the screenshot overlay
//!
//! This daemon runs next to the overlay UI and provides:
//! - Global hotkey detection via CGEventTap
//! - A fixed chord -> action table with an explicit registration lifecycle
//! - The window opacity/visibility state machine
//! - IPC server pushing window commands and renderer events to the UI
//!
//! Not covered here:
//! - Rendering, and the screenshot processing pipeline itself
//! - User-defined key bindings

mod config;
mod dispatch;
mod events;
mod hotkey;
mod ipc;
mod lifecycle;
mod services;
mod state;
mod window;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, SettingsStore};
use crate::dispatch::{default_bindings, Context, HotkeyDispatcher};
use crate::hotkey::{HotkeyListener, ShortcutRegistry};
use crate::ipc::{Notification, Server, ServerContext};
use crate::lifecycle::ShutdownSignal;
use crate::services::{ScreenshotCapture, ScreenshotQueue};
use crate::state::{AppState, VisibilityController};
use crate::window::{MainWindow, RemoteWindow};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "overlay-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.data_dir, "configuration loaded");

    let settings = Arc::new(SettingsStore::open(&config.settings_path));
    let shutdown = Arc::new(ShutdownSignal::new());

    // Hotkey listener and IPC triggers -> dispatcher
    let (hotkey_tx, hotkey_rx) = mpsc::channel(32);
    // Window model -> IPC subscribers
    let (notify_tx, _notify_rx) = broadcast::channel::<Notification>(64);

    let app_state = Arc::new(AppState::new());
    let window = Arc::new(RemoteWindow::new(
        settings.settings().opacity,
        notify_tx.clone(),
    ));
    let main_window = MainWindow::with(window.clone());

    let visibility = Arc::new(VisibilityController::new(
        main_window.clone(),
        settings.clone(),
        Arc::clone(&app_state),
    ));

    let queue = Arc::new(ScreenshotQueue::new(&config.screenshot_dir));
    let capture = Arc::new(ScreenshotCapture::new(
        config.capture_command.clone(),
        Arc::clone(&queue),
        Arc::clone(&app_state),
    ));

    let context = Context {
        window: main_window.clone(),
        visibility: Arc::clone(&visibility),
        capture,
        processing: None,
        queues: queue,
        views: app_state.clone(),
        mover: window.clone(),
        toggles: visibility,
        app: shutdown.clone(),
    };

    // Register the binding table
    let registry = Arc::new(ShortcutRegistry::new());
    let dispatcher = HotkeyDispatcher::new(Arc::clone(&registry), default_bindings()?, context);
    dispatcher.register_all()?;

    // Start the hotkey listener (runs on dedicated thread)
    let hotkey_listener = HotkeyListener::new(hotkey_tx.clone());
    match hotkey_listener.start() {
        Ok(()) => {
            info!("hotkey listener started");
        }
        Err(e) => {
            error!(?e, "failed to start hotkey listener");
            warn!("continuing without global hotkeys - chords can still be triggered over IPC");
        }
    }

    let server = Server::new(
        &config.socket_path,
        ServerContext {
            state: Arc::clone(&app_state),
            window: main_window.clone(),
            registry,
            hotkey_tx,
            notify_tx,
        },
    )?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Dispatch chords (from the listener and IPC triggers)
        _ = dispatcher.run(hotkey_rx) => {
            info!("dispatcher exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for a signal or the quit chord
        result = shutdown.wait() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "failed to listen for shutdown signals"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    dispatcher.unregister_all();
    hotkey_listener.stop();
    window.destroy();
    main_window.clear();
    server.shutdown().await;

    info!("overlay-daemon stopped");

    Ok(())
}
