// tests/command_filter.rs

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::path::PathBuf;

use testwatch::errors::TestwatchError;
use testwatch::search::{CommandFilter, TestFilter};

fn many_paths() -> Vec<PathBuf> {
    (0..5_000)
        .map(|i| PathBuf::from(format!("/repo/src/generated/module_{i:05}.test.js")))
        .collect()
}

#[tokio::test]
async fn filter_may_answer_before_reading_its_input() {
    init_tracing();
    // Writes far more than a pipe buffer before touching stdin.
    let filter = CommandFilter::new(
        r#"printf '{"filtered":[],"pad":"'; head -c 200000 /dev/zero | tr '\0' x; printf '"}'; cat > /dev/null"#,
    );

    let answer = with_timeout(filter.filter(many_paths())).await.unwrap();

    assert_eq!(answer["filtered"], serde_json::json!([]));
    assert_eq!(answer["pad"].as_str().map(str::len), Some(200_000));
}

#[tokio::test]
async fn filter_receives_the_candidates_as_json() {
    init_tracing();
    let filter = CommandFilter::new(
        r#"input=$(cat); printf '{"filtered":[{"test":"/repo/a.test.js","message":"%s"}]}' "$(printf '%s' "$input" | wc -c | tr -d ' ')""#,
    );
    let paths = vec![PathBuf::from("/repo/a.test.js")];
    let expected_len = serde_json::to_vec(&paths).unwrap().len().to_string();

    let answer = with_timeout(filter.filter(paths)).await.unwrap();

    assert_eq!(answer["filtered"][0]["test"], "/repo/a.test.js");
    assert_eq!(answer["filtered"][0]["message"], expected_len.as_str());
}

#[tokio::test]
async fn failing_filter_command_is_reported() {
    init_tracing();
    let filter = CommandFilter::new("echo broken >&2; exit 3");

    let err = with_timeout(filter.filter(many_paths())).await.unwrap_err();

    assert!(matches!(err, TestwatchError::FilterFailed { ref message, .. } if message.contains("broken")));
}
