//! Process-wide global shortcut table
//!
//! Plays the role of the host's global-shortcut facility: a chord only
//! produces an action while it is registered here. Teardown is terminal.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info};

use super::error::HotkeyError;
use super::keys::Chord;
use crate::dispatch::Action;

#[derive(Default)]
struct Table {
    bindings: HashMap<Chord, Action>,
    torn_down: bool,
}

/// Registered chord -> action bindings
#[derive(Default)]
pub struct ShortcutRegistry {
    table: Mutex<Table>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bind a chord. Fails if the chord is taken or the registry was torn down.
    pub fn register(&self, chord: Chord, action: Action) -> Result<(), HotkeyError> {
        let mut table = self.table();
        if table.torn_down {
            return Err(HotkeyError::TornDown);
        }
        if table.bindings.contains_key(&chord) {
            return Err(HotkeyError::AlreadyRegistered(chord));
        }
        debug!(%chord, ?action, "shortcut registered");
        table.bindings.insert(chord, action);
        Ok(())
    }

    /// Action bound to a chord, if any
    pub fn lookup(&self, chord: &Chord) -> Option<Action> {
        self.table().bindings.get(chord).copied()
    }

    pub fn is_registered(&self, chord: &Chord) -> bool {
        self.table().bindings.contains_key(chord)
    }

    /// Number of bound chords
    pub fn len(&self) -> usize {
        self.table().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every binding and refuse further registrations
    pub fn unregister_all(&self) {
        let mut table = self.table();
        let removed = table.bindings.len();
        table.bindings.clear();
        table.torn_down = true;
        info!(removed, "all shortcuts unregistered");
    }

    pub fn is_torn_down(&self) -> bool {
        self.table().torn_down
    }
}
