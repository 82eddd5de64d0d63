// src/exec/tap.rs

//! Parser for the TAP-style report a test command prints on stdout.
//!
//! ```text
//! ok 1 - math > adds
//! not ok 2 - math > renders # SNAPSHOT
//! ok 3 - math > later # TODO
//! ok 4 - math > flaky # SKIP
//! ok 5 - math > renders again # SNAPSHOT UPDATED
//! ```
//!
//! Lines that are not test points are ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::exec::results::{AssertionResult, AssertionStatus};

static TEST_POINT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(not ok|ok)\b(?:\s+\d+)?(?:\s+-)?\s*(.*?)(?:\s+#\s*(\w+)(?:\s+(\w+))?.*)?$").ok()
});

/// Assertions parsed from one file's output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapReport {
    pub assertions: Vec<AssertionResult>,
    /// Snapshots the test command reported as written.
    pub snapshots_updated: u32,
}

pub fn parse_tap(output: &str) -> TapReport {
    let mut report = TapReport::default();
    let Some(re) = TEST_POINT_RE.as_ref() else {
        return report;
    };

    for line in output.lines() {
        let Some(caps) = re.captures(line.trim_end()) else {
            continue;
        };
        let ok = &caps[1] == "ok";
        let name = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        let directive = caps.get(3).map(|m| m.as_str().to_ascii_uppercase());
        let detail = caps.get(4).map(|m| m.as_str().to_ascii_uppercase());

        let status = match (ok, directive.as_deref()) {
            (_, Some("SKIP")) => AssertionStatus::Skipped,
            (_, Some("TODO")) => AssertionStatus::Todo,
            (true, _) => AssertionStatus::Passed,
            (false, _) => AssertionStatus::Failed,
        };

        let mut assertion = AssertionResult::new(name, status);
        if directive.as_deref() == Some("SNAPSHOT") {
            if ok {
                if matches!(detail.as_deref(), Some("UPDATED") | Some("WRITTEN")) {
                    report.snapshots_updated += 1;
                }
            } else {
                assertion = assertion.with_failing_snapshot();
            }
        }
        report.assertions.push(assertion);
    }

    report
}
