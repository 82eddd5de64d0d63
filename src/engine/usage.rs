// src/engine/usage.rs

//! The "Watch Usage" banner and its pieces.

use crossterm::style::Stylize;

use crate::config::RunConfig;
use crate::plugins::UsageRow;

/// `Active Filters: filename /x/, test name /y/` header, or an empty string
/// when neither pattern is set.
pub fn active_filters(config: &RunConfig) -> String {
    let mut filters = Vec::new();
    if config.has_test_path_pattern() {
        let pattern = config.test_path_pattern.as_deref().unwrap_or_default();
        filters.push(format!("{} {}", "filename".dim(), format!("/{pattern}/").yellow()));
    }
    if !config.test_name_pattern.is_empty() {
        filters.push(format!(
            "{} {}",
            "test name".dim(),
            format!("/{}/", config.test_name_pattern).yellow()
        ));
    }
    if filters.is_empty() {
        return String::new();
    }
    format!("{}{}\n", "\nActive Filters: ".bold(), filters.join(", "))
}

fn press(key: &str, action: &str) -> String {
    format!("{}{key}{}", " \u{203A} Press ".dim(), format!(" to {action}.").dim())
}

/// Full banner for `config` with the plugin rows in display order.
pub fn usage(config: &RunConfig, rows: &[UsageRow]) -> String {
    let filtered = config.has_filters();
    let mut messages: Vec<String> = Vec::new();

    let header = active_filters(config);
    if !header.is_empty() {
        messages.push(header);
    }
    if filtered {
        messages.push(press("c", "clear filters"));
    }
    messages.push(format!("\n{}", "Watch Usage".bold()));
    if config.watch() {
        messages.push(press("a", "run all tests"));
    }
    if config.only_failures {
        messages.push(press("f", "quit \"only failed tests\" mode"));
    } else {
        messages.push(press("f", "run only failed tests"));
    }
    if (config.watch_all() || filtered) && !config.no_scm {
        messages.push(press("o", "only run tests related to changed files"));
    }
    for row in rows {
        messages.push(format!(
            "{} {} {}",
            " \u{203A} Press".dim(),
            row.key,
            format!("to {}.", row.prompt).dim()
        ));
    }
    messages.push(press("Enter", "trigger a test run"));

    format!("{}\n", messages.join("\n"))
}

/// One-line reminder printed after every run but the first.
pub fn toggle_usage_hint() -> String {
    format!(
        "\n{}{}w{}",
        "Watch Usage: ".bold(),
        "Press ".dim(),
        " to show more.".dim()
    )
}
