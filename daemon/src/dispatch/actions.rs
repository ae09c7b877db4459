//! The fixed chord -> action binding table

use serde::{Deserialize, Serialize};

use crate::hotkey::{Chord, ChordParseError};

/// Every action a global chord can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CaptureScreenshot,
    ProcessScreenshots,
    CancelAndReset,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ToggleVisibility,
    Quit,
    OpacityDown,
    OpacityUp,
    ZoomOut,
    ZoomIn,
    ZoomReset,
    DeleteLastScreenshot,
    ToggleClickThrough,
    EmergencyShow,
    ForceShow,
}

/// A chord bound to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub chord: Chord,
    pub action: Action,
}

/// Accelerators for the fixed table
pub const DEFAULT_BINDINGS: &[(&str, Action)] = &[
    ("CommandOrControl+H", Action::CaptureScreenshot),
    ("CommandOrControl+Enter", Action::ProcessScreenshots),
    ("CommandOrControl+R", Action::CancelAndReset),
    ("CommandOrControl+Left", Action::MoveLeft),
    ("CommandOrControl+Right", Action::MoveRight),
    ("CommandOrControl+Down", Action::MoveDown),
    ("CommandOrControl+Up", Action::MoveUp),
    ("CommandOrControl+B", Action::ToggleVisibility),
    ("CommandOrControl+Q", Action::Quit),
    ("CommandOrControl+[", Action::OpacityDown),
    ("CommandOrControl+]", Action::OpacityUp),
    ("CommandOrControl+-", Action::ZoomOut),
    ("CommandOrControl+0", Action::ZoomReset),
    ("CommandOrControl+=", Action::ZoomIn),
    ("CommandOrControl+L", Action::DeleteLastScreenshot),
    ("CommandOrControl+T", Action::ToggleClickThrough),
    ("CommandOrControl+Shift+V", Action::EmergencyShow),
    ("CommandOrControl+Shift+B", Action::ForceShow),
];

/// Parse an accelerator table into bindings
pub fn parse_bindings(table: &[(&str, Action)]) -> Result<Vec<Binding>, ChordParseError> {
    table
        .iter()
        .map(|&(accelerator, action)| {
            Ok(Binding {
                chord: accelerator.parse()?,
                action,
            })
        })
        .collect()
}

/// The default binding table
pub fn default_bindings() -> Result<Vec<Binding>, ChordParseError> {
    parse_bindings(DEFAULT_BINDINGS)
}
