//! Errors raised by the hotkey listener and shortcut registry

use super::keys::Chord;

/// Errors that can occur while listening for or registering hotkeys
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("global hotkeys are not supported on this platform")]
    Unsupported,

    #[error("chord {0} is already registered")]
    AlreadyRegistered(Chord),

    #[error("chord {0} appears more than once in the binding table")]
    DuplicateChord(Chord),

    #[error("shortcuts were unregistered and cannot be registered again")]
    TornDown,
}
