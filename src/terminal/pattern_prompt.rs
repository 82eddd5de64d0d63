// src/terminal/pattern_prompt.rs

//! Pattern-mode prompt shared by the path and test-name plugins.
//!
//! The prompt owns the key handling and the screen layout; what is matched
//! and how matches are rendered comes from a [`TypeaheadSource`].

use crossterm::style::Stylize;

use crate::terminal::keys::Key;
use crate::terminal::output::Terminal;
use crate::terminal::prompt::{PromptEvent, PromptSession};
use crate::terminal::scroll::{scroll, ScrollOptions};

/// Lines rendered under the prompt, plus what the cursor may select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternView {
    pub lines: Vec<String>,
    /// Number of matches (not only the visible ones).
    pub total: usize,
    /// Highlighted entry, submitted by Enter.
    pub selection: Option<String>,
}

/// Supplies typeahead matches for a pattern prompt.
pub trait TypeaheadSource: Send {
    /// "filename", "test name": used in the usage text.
    fn entity_name(&self) -> &'static str;

    fn on_pattern_change(&mut self, pattern: &str, options: ScrollOptions) -> PatternView;
}

pub fn pattern_mode_usage(entity: &str) -> String {
    format!(
        "\n{}\n {} Esc {}\n {} Enter {}\n\n",
        "Pattern Mode Usage".bold(),
        "\u{203A} Press".dim(),
        "to exit pattern mode.".dim(),
        "\u{203A} Press".dim(),
        format!("to filter by a {entity} regex pattern.").dim(),
    )
}

fn pluralize(noun: &str, count: usize) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Standard typeahead layout: match count, a scrolled window of `items`
/// with the cursor row highlighted, and a "...and N more" tail.
///
/// `noun` is the singular counted ("file", "test").
pub fn render_matches(
    entity: &str,
    noun: &str,
    pattern: &str,
    items: &[String],
    options: ScrollOptions,
) -> PatternView {
    if pattern.is_empty() {
        return PatternView {
            lines: vec![
                String::new(),
                format!(
                    " {}",
                    format!("Start typing to filter by a {entity} regex pattern.")
                        .italic()
                        .yellow()
                ),
            ],
            total: 0,
            selection: None,
        };
    }

    let total = items.len();
    let mut lines = vec![String::new(), format!(" Pattern matches {}", pluralize(noun, total))];

    let window = scroll(total, options);
    let mut selection = None;
    for (row, item) in items[window.start..window.end].iter().enumerate() {
        if row as isize == window.index {
            selection = Some(item.clone());
            lines.push(format!(" {} {}", "\u{203A}".dim(), item.clone().black().on_yellow()));
        } else {
            lines.push(format!(" {} {item}", "\u{203A}".dim()));
        }
    }

    let more = total - (window.end - window.start);
    if more > 0 {
        lines.push(format!(
            "  {}",
            format!("...and {more} more {}", if more == 1 { noun.to_string() } else { format!("{noun}s") })
                .dim()
        ));
    }

    PatternView {
        lines,
        total,
        selection,
    }
}

/// A [`PromptSession`] drawn on a [`Terminal`], with typeahead from `S`.
#[derive(Debug)]
pub struct PatternPrompt<S> {
    terminal: Terminal,
    session: PromptSession,
    source: S,
}

impl<S: TypeaheadSource> PatternPrompt<S> {
    pub fn new(terminal: Terminal, source: S) -> Self {
        Self {
            terminal,
            session: PromptSession::new(),
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Clear the screen, print `header` (the active filters) and the usage
    /// block, then start an empty prompt.
    pub fn run(&mut self, header: &str) {
        let t = &self.terminal;
        t.hide_cursor();
        t.clear_screen();
        if !header.is_empty() {
            t.write_line(header);
        }
        t.write_str(&pattern_mode_usage(self.source.entity_name()));
        t.show_cursor();

        let event = self.session.enter();
        self.render(&event);
    }

    pub fn put(&mut self, key: &Key) -> PromptEvent {
        let event = self.session.put(key);
        self.render(&event);
        event
    }

    fn render(&mut self, event: &PromptEvent) {
        let PromptEvent::Changed { value, options } = event else {
            return;
        };

        let t = &self.terminal;
        t.erase_line();
        t.write_str(&format!("{} {value}", " pattern \u{203A}".dim()));
        t.save_cursor();
        t.erase_down();

        let view = self.source.on_pattern_change(value, *options);
        self.session.set_typeahead_length(view.total);
        self.session.set_selection(view.selection);
        for line in &view.lines {
            t.write_str(&format!("\n{line}"));
        }
        t.restore_cursor();
    }
}
