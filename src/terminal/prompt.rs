// src/terminal/prompt.rs

use crate::terminal::keys::{ControlKey, Key};
use crate::terminal::scroll::ScrollOptions;

/// Rows shown under a typeahead prompt.
pub const MAX_ROWS: usize = 10;

/// What a keystroke did to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    /// The value or the highlighted row changed; redraw.
    Changed { value: String, options: ScrollOptions },
    /// Enter: the highlighted typeahead entry if any, else the typed value.
    Submitted(String),
    /// Escape, with the value typed so far.
    Cancelled(String),
    /// Key had no effect.
    Ignored,
}

/// Accumulates keystrokes into a pattern and tracks the typeahead cursor.
#[derive(Debug, Clone)]
pub struct PromptSession {
    value: String,
    offset: isize,
    typeahead_len: usize,
    selection: Option<String>,
    active: bool,
}

impl Default for PromptSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptSession {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            offset: -1,
            typeahead_len: 0,
            selection: None,
            active: false,
        }
    }

    /// Start a fresh session and return the initial change to render.
    pub fn enter(&mut self) -> PromptEvent {
        self.value.clear();
        self.offset = -1;
        self.typeahead_len = 0;
        self.selection = None;
        self.active = true;
        self.changed()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Number of typeahead entries; bounds the down arrow.
    pub fn set_typeahead_length(&mut self, len: usize) {
        self.typeahead_len = len;
    }

    /// Entry Enter submits instead of the typed value.
    pub fn set_selection(&mut self, selection: Option<String>) {
        self.selection = selection;
    }

    fn changed(&self) -> PromptEvent {
        PromptEvent::Changed {
            value: self.value.clone(),
            options: ScrollOptions {
                offset: self.offset,
                max: MAX_ROWS,
            },
        }
    }

    fn reset_cursor(&mut self) {
        self.offset = -1;
        self.selection = None;
    }

    pub fn put(&mut self, key: &Key) -> PromptEvent {
        if !self.active {
            return PromptEvent::Ignored;
        }

        match key {
            Key::Control(ControlKey::Enter) => {
                self.active = false;
                let submitted = self.selection.take().unwrap_or_else(|| self.value.clone());
                PromptEvent::Submitted(submitted)
            }
            Key::Control(ControlKey::Escape) => {
                self.active = false;
                PromptEvent::Cancelled(self.value.clone())
            }
            Key::Control(ControlKey::ArrowDown) => {
                let last = self.typeahead_len as isize - 1;
                self.offset = (self.offset + 1).min(last);
                self.changed()
            }
            Key::Control(ControlKey::ArrowUp) => {
                self.offset = (self.offset - 1).max(-1);
                self.changed()
            }
            Key::Control(ControlKey::CtrlU) => {
                self.value.clear();
                self.reset_cursor();
                self.changed()
            }
            Key::Control(ControlKey::Backspace) => {
                self.value.pop();
                self.reset_cursor();
                self.changed()
            }
            Key::Char(c) => {
                self.value.push(*c);
                self.reset_cursor();
                self.changed()
            }
            Key::Control(_) => PromptEvent::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(session: &mut PromptSession, text: &str) {
        for c in text.chars() {
            session.put(&Key::Char(c));
        }
    }

    #[test]
    fn typing_and_backspace_edit_the_value() {
        let mut session = PromptSession::new();
        session.enter();
        type_str(&mut session, "fooo");
        let ev = session.put(&Key::Control(ControlKey::Backspace));
        assert!(matches!(ev, PromptEvent::Changed { ref value, .. } if value == "foo"));
        assert_eq!(session.put(&Key::ENTER), PromptEvent::Submitted("foo".into()));
        assert!(!session.is_active());
    }

    #[test]
    fn arrows_are_bounded_by_typeahead() {
        let mut session = PromptSession::new();
        session.enter();
        session.set_typeahead_length(2);
        for _ in 0..5 {
            session.put(&Key::Control(ControlKey::ArrowDown));
        }
        let ev = session.put(&Key::Control(ControlKey::ArrowDown));
        assert!(matches!(ev, PromptEvent::Changed { options, .. } if options.offset == 1));

        for _ in 0..5 {
            session.put(&Key::Control(ControlKey::ArrowUp));
        }
        let ev = session.put(&Key::Control(ControlKey::ArrowUp));
        assert!(matches!(ev, PromptEvent::Changed { options, .. } if options.offset == -1));
    }

    #[test]
    fn enter_prefers_selection_and_typing_clears_it() {
        let mut session = PromptSession::new();
        session.enter();
        type_str(&mut session, "ab");
        session.set_selection(Some("src/ab.test.js".into()));
        assert_eq!(
            session.put(&Key::ENTER),
            PromptEvent::Submitted("src/ab.test.js".into())
        );

        session.enter();
        session.set_selection(Some("stale".into()));
        type_str(&mut session, "x");
        assert_eq!(session.put(&Key::ENTER), PromptEvent::Submitted("x".into()));
    }

    #[test]
    fn escape_and_ctrl_u() {
        let mut session = PromptSession::new();
        session.enter();
        type_str(&mut session, "abc");
        let ev = session.put(&Key::Control(ControlKey::CtrlU));
        assert!(matches!(ev, PromptEvent::Changed { ref value, .. } if value.is_empty()));
        type_str(&mut session, "z");
        assert_eq!(session.put(&Key::ESCAPE), PromptEvent::Cancelled("z".into()));
        assert_eq!(session.put(&Key::Char('q')), PromptEvent::Ignored);
    }

    #[test]
    fn horizontal_arrows_are_ignored() {
        let mut session = PromptSession::new();
        session.enter();
        assert_eq!(
            session.put(&Key::Control(ControlKey::ArrowLeft)),
            PromptEvent::Ignored
        );
    }
}
