// tests/config_loader.rs

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tempfile::TempDir;

use testwatch::build_run_config;
use testwatch::cli::CliArgs;
use testwatch::config::loader::{load_and_validate, DEFAULT_CONFIG_FILE};
use testwatch::errors::TestwatchError;
use testwatch::types::{UpdateSnapshot, WatchMode};

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn full_config_is_compiled() {
    let (dir, path) = write_config(
        r#"
[watch]
watch_all = true
coverage_directory = "reports/coverage"
watch_path_ignore_patterns = ["\\.generated\\."]
bail = 2

[runner]
command = "node --test {path}"

[[project]]
name = "app"
root_dir = "packages/app"
roots = ["src"]
test_match = ["**/*.test.ts"]

[[project]]
name = "lib"
root_dir = "packages/lib"

[[watch_plugin]]
path = "./scripts/plugin.sh"
config = { key = "x", prompt = "do things" }
"#,
    );

    let cfg = load_and_validate(&path).unwrap();
    let base = dir.path().canonicalize().unwrap();

    assert!(cfg.watch.watch_all);
    assert_eq!(cfg.watch.coverage_directory, "reports/coverage");
    assert_eq!(cfg.watch.bail, 2);
    assert_eq!(cfg.watch.debounce_ms, 50);
    assert_eq!(cfg.runner.command, "node --test {path}");
    assert_eq!(cfg.base_dir, base);

    assert_eq!(cfg.projects.len(), 2);
    let app = &cfg.projects[0];
    assert_eq!(app.name, "app");
    assert_eq!(app.root_dir, base.join("packages/app"));
    assert_eq!(app.roots, vec![base.join("packages/app/src")]);
    assert_eq!(app.test_match, vec!["**/*.test.ts".to_string()]);

    let lib = &cfg.projects[1];
    assert_eq!(lib.roots, vec![base.join("packages/lib")]);
    assert_eq!(lib.test_path_ignore_patterns, vec!["/node_modules/".to_string()]);

    assert_eq!(cfg.watch_plugins.len(), 1);
    assert_eq!(
        cfg.watch_plugins[0].config.get("key").and_then(|v| v.as_str()),
        Some("x")
    );
}

#[test]
fn empty_config_yields_one_default_project() {
    let (dir, path) = write_config("");
    let cfg = load_and_validate(&path).unwrap();

    assert!(!cfg.watch.watch_all);
    assert_eq!(cfg.watch.coverage_directory, "coverage");
    assert_eq!(cfg.runner.command, "node {path}");
    assert_eq!(cfg.projects.len(), 1);
    assert_eq!(cfg.projects[0].root_dir, dir.path().canonicalize().unwrap());
}

#[test]
fn invalid_ignore_pattern_is_rejected() {
    let (_dir, path) = write_config("[watch]\nwatch_path_ignore_patterns = [\"(\"]\n");
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, TestwatchError::InvalidPattern { ref pattern, .. } if pattern == "("));
}

#[test]
fn empty_runner_command_is_rejected() {
    let (_dir, path) = write_config("[runner]\ncommand = \"  \"\n");
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, TestwatchError::ConfigError(_)));
}

#[test]
fn plugin_without_path_is_rejected() {
    let (_dir, path) = write_config("[[watch_plugin]]\npath = \"\"\n");
    assert!(matches!(
        load_and_validate(&path).unwrap_err(),
        TestwatchError::ConfigError(_)
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[watch\nwatch_all = true");
    assert!(matches!(
        load_and_validate(&path).unwrap_err(),
        TestwatchError::TomlError(_)
    ));
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, TestwatchError::IoError(_)));
}

#[test]
fn cli_flags_override_the_file() {
    let (_dir, path) = write_config("[watch]\nbail = 3\n");
    let cfg = load_and_validate(&path).unwrap();

    let args = CliArgs::try_parse_from([
        "testwatch",
        "--watch-all",
        "--test-path-pattern",
        "math",
        "--bail",
        "1",
        "--update-snapshot",
        "all",
        "--changed-files-with-ancestor",
    ])
    .unwrap();
    let config = build_run_config(&args, &cfg, PathBuf::from("/repo"), true);

    assert_eq!(config.mode, WatchMode::WatchAll);
    assert_eq!(config.test_path_pattern.as_deref(), Some("math"));
    assert_eq!(config.bail, 1);
    assert_eq!(config.update_snapshot, UpdateSnapshot::All);
    assert!(config.with_ancestor);
    assert_eq!(config.cwd, PathBuf::from("/repo"));
}

#[test]
fn snapshot_default_depends_on_interactivity() {
    let (_dir, path) = write_config("[watch]\nbail = 3\n");
    let cfg = load_and_validate(&path).unwrap();
    let args = CliArgs::try_parse_from(["testwatch"]).unwrap();

    let interactive = build_run_config(&args, &cfg, PathBuf::from("/repo"), true);
    assert_eq!(interactive.update_snapshot, UpdateSnapshot::New);
    assert_eq!(interactive.bail, 3);
    assert!(interactive.only_changed);
    assert!(!interactive.with_ancestor);

    let ci = build_run_config(&args, &cfg, PathBuf::from("/repo"), false);
    assert_eq!(ci.update_snapshot, UpdateSnapshot::None);
}
