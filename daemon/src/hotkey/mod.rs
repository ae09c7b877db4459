//! Hotkey module for global keyboard chords
//!
//! The listener turns OS key events into chords; the registry is the
//! process-wide table of chords that currently trigger an action.

mod error;
mod keys;
mod listener;
mod registry;

pub use error::HotkeyError;
pub use keys::{Chord, ChordParseError};
pub use listener::{HotkeyEvent, HotkeyListener};
pub use registry::ShortcutRegistry;
