// src/terminal/mod.rs

//! Terminal I/O for the watch UI.
//!
//! Keys are decoded once at the boundary ([`keys`]); everything above works
//! with [`Key`]. Output goes through a cloneable [`Terminal`] so tests can
//! capture it.

pub mod keys;
pub mod output;
pub mod pattern_prompt;
pub mod prompt;
pub mod scroll;
pub mod tty;

pub use keys::{ControlKey, Key};
pub use output::{CaptureBuffer, Terminal};
pub use pattern_prompt::{render_matches, PatternPrompt, PatternView, TypeaheadSource};
pub use prompt::{PromptEvent, PromptSession, MAX_ROWS};
pub use scroll::{scroll, ScrollOptions, ScrollWindow};
pub use tty::{is_interactive, spawn_key_reader, stdin_is_terminal, RawModeGuard};
