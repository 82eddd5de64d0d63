// tests/snapshot_review.rs

mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use testwatch::exec::{AggregatedResult, AssertionLocation};
use testwatch::snapshot::{ReviewAction, SnapshotReviewController};
use testwatch::terminal::{Key, Terminal};

type Calls = Arc<Mutex<Vec<(Option<String>, bool)>>>;

fn loc(name: &str) -> AssertionLocation {
    AssertionLocation {
        full_name: name.to_string(),
        path: PathBuf::from(format!("/repo/src/{name}.test.js")),
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

#[derive(Debug, Clone)]
enum Step {
    Key(char),
    Enter,
    Passed,
    StillFailing,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        prop_oneof![Just('s'), Just('u'), Just('r'), Just('q'), Just('x')].prop_map(Step::Key),
        Just(Step::Enter),
        Just(Step::Passed),
        Just(Step::StillFailing),
    ]
}

fn counts_balance(review: &SnapshotReviewController) -> bool {
    review.updated() + review.remaining() + review.skipped() == review.original_count()
}

proptest! {
    #[test]
    fn counts_always_add_up(
        size in 1..6usize,
        steps in proptest::collection::vec(step_strategy(), 0..30),
    ) {
        let (terminal, _buf) = Terminal::capture(true);
        let mut review = SnapshotReviewController::new(terminal);
        let (action, _calls) = recorder();
        let names: Vec<String> = (0..size).map(|i| format!("t{i}")).collect();

        review.run(names.iter().map(|n| loc(n)).collect(), action);
        prop_assert!(counts_balance(&review));

        for step in steps {
            match step {
                Step::Key(c) => review.put(&Key::Char(c)),
                Step::Enter => review.put(&Key::ENTER),
                Step::Passed => review.update_with_results(&AggregatedResult::default()),
                Step::StillFailing => {
                    let mut result = AggregatedResult::default();
                    result.snapshot.failure = true;
                    review.update_with_results(&result);
                }
            }
            prop_assert!(counts_balance(&review));
        }
    }
}

#[test]
fn skip_rotates_and_update_targets_the_new_head() {
    let (terminal, _buf) = Terminal::capture(true);
    let mut review = SnapshotReviewController::new(terminal);
    let (action, calls) = recorder();

    review.run(vec![loc("A"), loc("B")], action);
    review.put(&Key::Char('s'));
    review.put(&Key::Char('u'));

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            (Some("A".to_string()), false),
            (Some("B".to_string()), false),
            (Some("B".to_string()), true),
        ]
    );

    // Only a restart resets the skip counter.
    review.update_with_results(&AggregatedResult::default());
    assert_eq!(review.skipped(), 1);
    review.put(&Key::Char('r'));
    assert_eq!(review.skipped(), 0);
}

#[test]
fn progress_overlay_reports_remaining_and_skipped() {
    let (terminal, buf) = Terminal::capture(true);
    let mut review = SnapshotReviewController::new(terminal);
    let (action, _calls) = recorder();

    review.run(vec![loc("A"), loc("B"), loc("C")], action);
    review.put(&Key::Char('s'));

    let mut failing = AggregatedResult::default();
    failing.snapshot.failure = true;
    review.update_with_results(&failing);

    let out = buf.plain();
    assert!(out.contains("Interactive Snapshot Progress"));
    assert!(out.contains("2 snapshots remaining, 1 snapshot skipped"));
    assert!(out.contains("Press u to update failing snapshots for this test."));
}
