// src/snapshot/review.rs

use std::collections::VecDeque;
use std::fmt;

use crossterm::style::Stylize;
use tracing::debug;

use crate::exec::results::{AggregatedResult, AssertionLocation};
use crate::terminal::{ControlKey, Key, Terminal};

/// Called with the assertion to re-run and whether its snapshots should be
/// written. `None` means "leave interactive snapshot mode".
pub type ReviewAction = Box<dyn FnMut(Option<&AssertionLocation>, bool) + Send>;

const ARROW: &str = " \u{203A} ";

/// Rows of the progress block; erased before it is redrawn.
const PROGRESS_ROWS: u16 = 6;

fn pluralize(word: &str, count: usize) -> String {
    format!("{count} {word}{}", if count == 1 { "" } else { "s" })
}

/// Walks the user through failing snapshot assertions one at a time.
///
/// The queue head is the assertion under review. Skipping rotates it to the
/// tail; a successful re-run removes it. `updated + remaining + skipped`
/// always equals the count taken when the review (re)started.
pub struct SnapshotReviewController {
    terminal: Terminal,
    queue: VecDeque<AssertionLocation>,
    count: usize,
    skipped: usize,
    active: bool,
    on_action: Option<ReviewAction>,
}

impl fmt::Debug for SnapshotReviewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotReviewController")
            .field("queue", &self.queue)
            .field("count", &self.count)
            .field("skipped", &self.skipped)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl SnapshotReviewController {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            terminal,
            queue: VecDeque::new(),
            count: 0,
            skipped: 0,
            active: false,
            on_action: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Assertions counted when the review started or was restarted.
    pub fn original_count(&self) -> usize {
        self.count
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.skipped)
    }

    pub fn updated(&self) -> usize {
        self.count - self.queue.len()
    }

    pub fn current(&self) -> Option<&AssertionLocation> {
        self.queue.front()
    }

    /// Start reviewing `assertions`. Does nothing for an empty list.
    pub fn run(&mut self, assertions: Vec<AssertionLocation>, on_action: ReviewAction) {
        if assertions.is_empty() {
            return;
        }
        self.queue = assertions.into();
        self.count = self.queue.len();
        self.skipped = 0;
        self.on_action = Some(on_action);
        self.active = true;
        debug!(count = self.count, "interactive snapshot review started");
        self.dispatch(false);
    }

    pub fn put(&mut self, key: &Key) {
        match key {
            Key::Char('s') => {
                if self.skipped == self.queue.len() {
                    return;
                }
                self.skipped += 1;
                self.queue.rotate_left(1);
                if self.remaining() > 0 {
                    self.dispatch(false);
                } else {
                    self.draw_done_with_skipped();
                }
            }
            Key::Char('u') => self.dispatch(true),
            Key::Char('q') | Key::Control(ControlKey::Escape) => self.abort(),
            Key::Char('r') => self.restart(),
            Key::Control(ControlKey::Enter) => {
                if self.queue.is_empty() {
                    self.abort();
                } else {
                    self.dispatch(false);
                }
            }
            _ => {}
        }
    }

    pub fn abort(&mut self) {
        self.active = false;
        self.skipped = 0;
        if let Some(action) = self.on_action.as_mut() {
            action(None, false);
        }
    }

    pub fn restart(&mut self) {
        self.skipped = 0;
        self.count = self.queue.len();
        self.dispatch(false);
    }

    /// Feed the result of re-running the current assertion.
    pub fn update_with_results(&mut self, results: &AggregatedResult) {
        if results.snapshot.failure {
            self.draw_overlay();
            return;
        }

        self.queue.pop_front();
        self.skipped = self.skipped.min(self.queue.len());
        if self.remaining() == 0 {
            self.draw_overlay();
            return;
        }
        self.dispatch(false);
    }

    fn dispatch(&mut self, update_snapshot: bool) {
        let head = self.queue.front();
        if let Some(action) = self.on_action.as_mut() {
            action(head, update_snapshot);
        }
    }

    fn draw_overlay(&self) {
        if self.queue.is_empty() {
            self.draw_done();
        } else if self.remaining() == 0 {
            self.draw_done_with_skipped();
        } else {
            self.draw_progress();
        }
    }

    fn stats(&self, head: String) -> String {
        let mut stats = head;
        let updated = self.updated();
        if updated > 0 {
            stats.push_str(&format!(", {} updated", pluralize("snapshot", updated)));
        }
        if self.skipped > 0 {
            stats.push_str(&format!(", {} skipped", pluralize("snapshot", self.skipped)));
        }
        stats
    }

    fn write_block(&self, messages: &[String]) {
        self.terminal.write_str(&format!("{}\n", messages.join("\n")));
    }

    fn draw_progress(&self) {
        self.terminal.cursor_up(PROGRESS_ROWS);
        self.terminal.erase_down();
        let stats = self.stats(format!("{} remaining", pluralize("snapshot", self.remaining())));
        self.write_block(&[
            format!("\n{}", "Interactive Snapshot Progress".bold()),
            format!("{ARROW}{stats}"),
            format!("\n{}", "Watch Usage".bold()),
            format!("{}u{}", format!("{ARROW}Press ").dim(), " to update failing snapshots for this test.".dim()),
            format!("{}s{}", format!("{ARROW}Press ").dim(), " to skip the current test.".dim()),
            format!("{}q{}", format!("{ARROW}Press ").dim(), " to quit Interactive Snapshot Mode.".dim()),
            format!("{}Enter{}", format!("{ARROW}Press ").dim(), " to trigger a test run.".dim()),
        ]);
    }

    fn draw_done_with_skipped(&self) {
        self.terminal.clear_screen();
        let stats = self.stats(format!("{} reviewed", pluralize("snapshot", self.count)));
        self.write_block(&[
            format!("\n{}", "Interactive Snapshot Result".bold()),
            format!("{ARROW}{stats}"),
            format!("\n{}", "Watch Usage".bold()),
            format!("{}r{}", format!("{ARROW}Press ").dim(), " to restart Interactive Snapshot Mode.".dim()),
            format!("{}q{}", format!("{ARROW}Press ").dim(), " to quit Interactive Snapshot Mode.".dim()),
        ]);
    }

    fn draw_done(&self) {
        self.terminal.clear_screen();
        let stats = self.stats(format!("{} reviewed", pluralize("snapshot", self.count)));
        self.write_block(&[
            format!("\n{}", "Interactive Snapshot Result".bold()),
            format!("{ARROW}{stats}"),
            format!("\n{}", "Watch Usage".bold()),
            format!("{}Enter{}", format!("{ARROW}Press ").dim(), " to return to watch mode.".dim()),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::*;

    type Calls = Arc<Mutex<Vec<(Option<String>, bool)>>>;

    fn loc(name: &str) -> AssertionLocation {
        AssertionLocation {
            full_name: name.to_string(),
            path: PathBuf::from(format!("/repo/{name}.test.js")),
        }
    }

    fn recorder() -> (ReviewAction, Calls) {
        let calls: Calls = Arc::default();
        let sink = Arc::clone(&calls);
        let action: ReviewAction = Box::new(move |assertion, update| {
            sink.lock()
                .unwrap()
                .push((assertion.map(|a| a.full_name.clone()), update));
        });
        (action, calls)
    }

    fn passing() -> AggregatedResult {
        AggregatedResult::default()
    }

    fn still_failing() -> AggregatedResult {
        let mut result = AggregatedResult::default();
        result.snapshot.failure = true;
        result
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let (terminal, _buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();
        review.run(vec![], action);
        assert!(!review.is_active());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn skip_then_update_targets_the_rotated_head() {
        let (terminal, _buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();

        review.run(vec![loc("A"), loc("B")], action);
        review.put(&Key::Char('s'));
        review.put(&Key::Char('u'));

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                (Some("A".into()), false),
                (Some("B".into()), false),
                (Some("B".into()), true),
            ]
        );
        assert_eq!(review.skipped(), 1);
    }

    #[test]
    fn skipping_everything_shows_the_summary_without_dispatching() {
        let (terminal, buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();

        review.run(vec![loc("A"), loc("B")], action);
        review.put(&Key::Char('s'));
        review.put(&Key::Char('s'));
        // Further skips are ignored once everything is skipped.
        review.put(&Key::Char('s'));

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(review.skipped(), 2);
        let out = buf.plain();
        assert!(out.contains("Interactive Snapshot Result"));
        assert!(out.contains("2 snapshots reviewed, 2 snapshots skipped"));
        assert!(out.contains("Press r to restart Interactive Snapshot Mode."));
    }

    #[test]
    fn restart_resets_skips_and_baseline() {
        let (terminal, _buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();

        review.run(vec![loc("A"), loc("B"), loc("C")], action);
        review.update_with_results(&passing());
        review.put(&Key::Char('s'));
        assert_eq!(review.skipped(), 1);

        review.put(&Key::Char('r'));
        assert_eq!(review.skipped(), 0);
        assert_eq!(review.original_count(), 2);
        // B was skipped to the tail, so C is up first again.
        assert_eq!(
            calls.lock().unwrap().last(),
            Some(&(Some("C".into()), false))
        );
    }

    #[test]
    fn results_advance_or_stay() {
        let (terminal, buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();

        review.run(vec![loc("A"), loc("B")], action);
        review.update_with_results(&still_failing());
        assert_eq!(review.current().map(|a| a.full_name.as_str()), Some("A"));
        assert!(buf.plain().contains("2 snapshots remaining"));

        review.update_with_results(&passing());
        assert_eq!(review.current().map(|a| a.full_name.as_str()), Some("B"));
        assert_eq!(
            calls.lock().unwrap().last(),
            Some(&(Some("B".into()), false))
        );

        review.update_with_results(&passing());
        assert!(review.current().is_none());
        let out = buf.plain();
        assert!(out.contains("2 snapshots reviewed, 2 snapshots updated"));
        assert!(out.contains("Press Enter to return to watch mode."));

        review.put(&Key::ENTER);
        assert!(!review.is_active());
        assert_eq!(calls.lock().unwrap().last(), Some(&(None, false)));
    }

    #[test]
    fn quit_aborts_with_sentinel() {
        let (terminal, _buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, calls) = recorder();

        review.run(vec![loc("A")], action);
        review.put(&Key::ESCAPE);
        assert!(!review.is_active());
        assert_eq!(calls.lock().unwrap().last(), Some(&(None, false)));
    }
}
