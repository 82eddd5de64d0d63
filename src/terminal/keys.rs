// src/terminal/keys.rs

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Named control keys the watch UI reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Enter,
    Escape,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CtrlC,
    CtrlD,
    CtrlU,
}

/// A single decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Control(ControlKey),
    Char(char),
}

impl Key {
    pub const ENTER: Key = Key::Control(ControlKey::Enter);
    pub const ESCAPE: Key = Key::Control(ControlKey::Escape);

    /// Decode a crossterm key event. Releases and unsupported keys yield `None`.
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let key = match event.code {
            KeyCode::Char('c') if ctrl => Key::Control(ControlKey::CtrlC),
            KeyCode::Char('d') if ctrl => Key::Control(ControlKey::CtrlD),
            KeyCode::Char('u') if ctrl => Key::Control(ControlKey::CtrlU),
            KeyCode::Char(_) if ctrl => return None,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Control(ControlKey::Enter),
            KeyCode::Esc => Key::Control(ControlKey::Escape),
            KeyCode::Backspace => Key::Control(ControlKey::Backspace),
            KeyCode::Up => Key::Control(ControlKey::ArrowUp),
            KeyCode::Down => Key::Control(ControlKey::ArrowDown),
            KeyCode::Left => Key::Control(ControlKey::ArrowLeft),
            KeyCode::Right => Key::Control(ControlKey::ArrowRight),
            _ => return None,
        };
        Some(key)
    }

    /// Ctrl-C and Ctrl-D end the session from any state.
    pub fn is_hard_quit(&self) -> bool {
        matches!(
            self,
            Key::Control(ControlKey::CtrlC) | Key::Control(ControlKey::CtrlD)
        )
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Key::Char(c) => Some(*c),
            Key::Control(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::Control(ControlKey::Enter) => f.write_str("Enter"),
            Key::Control(ControlKey::Escape) => f.write_str("Esc"),
            Key::Control(other) => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_control_combinations() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&ev), Some(Key::Control(ControlKey::CtrlC)));
        assert!(Key::from_event(&ev).is_some_and(|k| k.is_hard_quit()));

        let ev = KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&ev), Some(Key::Char('p')));

        let ev = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&ev), None);
    }
}
