//! Chord definitions: modifier state, keys, and accelerator parsing
//!
//! Accelerators use the familiar `Modifier+Modifier+Key` form, e.g.
//! `CommandOrControl+Shift+V`. The platform primary modifier is resolved
//! at parse time so a chord compares equal to what the listener reports.

use std::fmt;
use std::str::FromStr;

/// Modifier key flag masks from macOS CGEventFlags
#[cfg(target_os = "macos")]
pub mod flags {
    use core_graphics::event::CGEventFlags;

    /// Control key modifier flag
    pub const CONTROL: CGEventFlags = CGEventFlags::CGEventFlagControl;
    /// Option/Alt key modifier flag
    pub const OPTION: CGEventFlags = CGEventFlags::CGEventFlagAlternate;
    /// Command key modifier flag
    pub const COMMAND: CGEventFlags = CGEventFlags::CGEventFlagCommand;
    /// Shift key modifier flag
    pub const SHIFT: CGEventFlags = CGEventFlags::CGEventFlagShift;
}

/// Tracks which modifier keys are part of a chord
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    /// Control key is held
    pub control: bool,
    /// Option/Alt key is held
    pub option: bool,
    /// Command key is held
    pub command: bool,
    /// Shift key is held
    pub shift: bool,
}

impl ModifierState {
    /// Create a new ModifierState from CGEventFlags
    #[cfg(target_os = "macos")]
    pub fn from_flags(event_flags: core_graphics::event::CGEventFlags) -> Self {
        Self {
            control: event_flags.contains(flags::CONTROL),
            option: event_flags.contains(flags::OPTION),
            command: event_flags.contains(flags::COMMAND),
            shift: event_flags.contains(flags::SHIFT),
        }
    }

    /// Only the platform primary modifier (Command on macOS, Control elsewhere)
    pub fn primary() -> Self {
        let mut state = Self::default();
        state.set_primary();
        state
    }

    fn set_primary(&mut self) {
        if cfg!(target_os = "macos") {
            self.command = true;
        } else {
            self.control = true;
        }
    }

    /// Check if all modifiers are released
    pub fn is_empty(&self) -> bool {
        !self.control && !self.option && !self.command && !self.shift
    }
}

/// Non-modifier keys that can terminate a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Letter key, always stored uppercase
    Letter(char),
    /// Digit key on the main row
    Digit(u8),
    Enter,
    Left,
    Right,
    Up,
    Down,
    Minus,
    Equal,
    BracketLeft,
    BracketRight,
}

impl Key {
    fn parse(token: &str) -> Option<Self> {
        let upper = token.to_ascii_uppercase();
        let key = match upper.as_str() {
            "ENTER" | "RETURN" => Key::Enter,
            "LEFT" => Key::Left,
            "RIGHT" => Key::Right,
            "UP" => Key::Up,
            "DOWN" => Key::Down,
            "-" | "MINUS" => Key::Minus,
            "=" | "PLUS" | "EQUAL" => Key::Equal,
            "[" => Key::BracketLeft,
            "]" => Key::BracketRight,
            _ => {
                let mut chars = upper.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                if c.is_ascii_uppercase() {
                    Key::Letter(c)
                } else if let Some(d) = c.to_digit(10) {
                    Key::Digit(d as u8)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }

    /// Map a macOS virtual keycode (kVK_*) to a chord key
    pub fn from_mac_keycode(code: i64) -> Option<Self> {
        let key = match code {
            0x00 => Key::Letter('A'),
            0x01 => Key::Letter('S'),
            0x02 => Key::Letter('D'),
            0x03 => Key::Letter('F'),
            0x04 => Key::Letter('H'),
            0x05 => Key::Letter('G'),
            0x06 => Key::Letter('Z'),
            0x07 => Key::Letter('X'),
            0x08 => Key::Letter('C'),
            0x09 => Key::Letter('V'),
            0x0B => Key::Letter('B'),
            0x0C => Key::Letter('Q'),
            0x0D => Key::Letter('W'),
            0x0E => Key::Letter('E'),
            0x0F => Key::Letter('R'),
            0x10 => Key::Letter('Y'),
            0x11 => Key::Letter('T'),
            0x12 => Key::Digit(1),
            0x13 => Key::Digit(2),
            0x14 => Key::Digit(3),
            0x15 => Key::Digit(4),
            0x16 => Key::Digit(6),
            0x17 => Key::Digit(5),
            0x18 => Key::Equal,
            0x19 => Key::Digit(9),
            0x1A => Key::Digit(7),
            0x1B => Key::Minus,
            0x1C => Key::Digit(8),
            0x1D => Key::Digit(0),
            0x1E => Key::BracketRight,
            0x1F => Key::Letter('O'),
            0x20 => Key::Letter('U'),
            0x21 => Key::BracketLeft,
            0x22 => Key::Letter('I'),
            0x23 => Key::Letter('P'),
            0x24 => Key::Enter,
            0x25 => Key::Letter('L'),
            0x26 => Key::Letter('J'),
            0x28 => Key::Letter('K'),
            0x2D => Key::Letter('N'),
            0x2E => Key::Letter('M'),
            0x4C => Key::Enter,
            0x7B => Key::Left,
            0x7C => Key::Right,
            0x7D => Key::Down,
            0x7E => Key::Up,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{}", c),
            Key::Digit(d) => write!(f, "{}", d),
            Key::Enter => write!(f, "Enter"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Minus => write!(f, "-"),
            Key::Equal => write!(f, "="),
            Key::BracketLeft => write!(f, "["),
            Key::BracketRight => write!(f, "]"),
        }
    }
}

/// A modifier set plus a terminating key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: ModifierState,
    pub key: Key,
}

impl Chord {
    pub fn new(modifiers: ModifierState, key: Key) -> Self {
        Self { modifiers, key }
    }
}

/// Errors produced while parsing an accelerator string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("accelerator is empty")]
    Empty,

    #[error("unknown key or modifier '{0}'")]
    UnknownToken(String),

    #[error("accelerator '{0}' has no key")]
    MissingKey(String),

    #[error("accelerator '{0}' has more than one key")]
    MultipleKeys(String),
}

impl FromStr for Chord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChordParseError::Empty);
        }

        // A trailing "+" names the plus key itself, e.g. "Ctrl++"
        let (body, plus_key) = match s.strip_suffix("++") {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let mut modifiers = ModifierState::default();
        let mut key = if plus_key { Some(Key::Equal) } else { None };

        for token in body.split('+').map(str::trim) {
            match token.to_ascii_lowercase().as_str() {
                "commandorcontrol" | "cmdorctrl" => modifiers.set_primary(),
                "control" | "ctrl" => modifiers.control = true,
                "command" | "cmd" | "super" | "meta" => modifiers.command = true,
                "alt" | "option" => modifiers.option = true,
                "shift" => modifiers.shift = true,
                "" => return Err(ChordParseError::UnknownToken(token.to_string())),
                _ => {
                    let parsed = Key::parse(token)
                        .ok_or_else(|| ChordParseError::UnknownToken(token.to_string()))?;
                    if key.replace(parsed).is_some() {
                        return Err(ChordParseError::MultipleKeys(s.to_string()));
                    }
                }
            }
        }

        key.map(|key| Chord { modifiers, key })
            .ok_or_else(|| ChordParseError::MissingKey(s.to_string()))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        if m.control {
            write!(f, "Ctrl+")?;
        }
        if m.option {
            write!(f, "Alt+")?;
        }
        if m.command {
            write!(f, "Command+")?;
        }
        if m.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = ModifierState::default();
        assert!(state.is_empty());
        assert!(!ModifierState::primary().is_empty());
    }

    #[test]
    fn test_primary_modifier_resolution() {
        let chord: Chord = "CommandOrControl+H".parse().unwrap();
        assert_eq!(chord.key, Key::Letter('H'));
        assert_eq!(chord.modifiers, ModifierState::primary());
        if cfg!(target_os = "macos") {
            assert!(chord.modifiers.command && !chord.modifiers.control);
        } else {
            assert!(chord.modifiers.control && !chord.modifiers.command);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let a: Chord = "cmdorctrl+shift+v".parse().unwrap();
        let b: Chord = "CommandOrControl+Shift+V".parse().unwrap();
        assert_eq!(a, b);
        assert!(a.modifiers.shift);
    }

    #[test]
    fn test_parse_punctuation_keys() {
        let cases = [
            ("Ctrl+[", Key::BracketLeft),
            ("Ctrl+]", Key::BracketRight),
            ("Ctrl+-", Key::Minus),
            ("Ctrl+=", Key::Equal),
            ("Ctrl++", Key::Equal),
            ("Ctrl+0", Key::Digit(0)),
            ("Ctrl+Enter", Key::Enter),
            ("Ctrl+Left", Key::Left),
        ];
        for (input, expected) in cases {
            let chord: Chord = input.parse().unwrap();
            assert_eq!(chord.key, expected, "{}", input);
            assert!(chord.modifiers.control);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Chord>(), Err(ChordParseError::Empty));
        assert!(matches!(
            "Ctrl+Shift".parse::<Chord>(),
            Err(ChordParseError::MissingKey(_))
        ));
        assert!(matches!(
            "Ctrl+A+B".parse::<Chord>(),
            Err(ChordParseError::MultipleKeys(_))
        ));
        assert!(matches!(
            "Hyper+A".parse::<Chord>(),
            Err(ChordParseError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_display_is_reparseable() {
        let chord: Chord = "Ctrl+Shift+V".parse().unwrap();
        assert_eq!(chord.to_string(), "Ctrl+Shift+V");
        assert_eq!(chord.to_string().parse::<Chord>().unwrap(), chord);
    }

    #[test]
    fn test_mac_keycodes() {
        assert_eq!(Key::from_mac_keycode(0x04), Some(Key::Letter('H')));
        assert_eq!(Key::from_mac_keycode(0x21), Some(Key::BracketLeft));
        assert_eq!(Key::from_mac_keycode(0x7B), Some(Key::Left));
        assert_eq!(Key::from_mac_keycode(0x39), None);
    }
}
