// tests/config_update.rs

mod common;
use crate::common::builders::RunConfigBuilder;

use proptest::prelude::*;

use testwatch::config::{update_run_config, ConfigUpdate, RunConfig};
use testwatch::types::{UpdateSnapshot, WatchMode};

fn mode_strategy() -> impl Strategy<Value = Option<WatchMode>> {
    prop_oneof![
        Just(None),
        Just(Some(WatchMode::Watch)),
        Just(Some(WatchMode::WatchAll)),
    ]
}

fn pattern_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), Just(Some(String::new())), "[a-z]{1,4}".prop_map(Some)]
}

fn update_strategy() -> impl Strategy<Value = ConfigUpdate> {
    (
        mode_strategy(),
        pattern_strategy(),
        pattern_strategy(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(prop_oneof![
            Just(UpdateSnapshot::All),
            Just(UpdateSnapshot::None),
            Just(UpdateSnapshot::New),
        ]),
    )
        .prop_map(
            |(mode, name, path, only_failures, no_scm, update_snapshot)| ConfigUpdate {
                mode,
                test_name_pattern: name,
                test_path_pattern: path,
                only_failures,
                no_scm,
                update_snapshot,
                ..ConfigUpdate::default()
            },
        )
}

fn derived_only_changed(config: &RunConfig) -> bool {
    !config.watch_all() && config.test_name_pattern.is_empty() && !config.has_test_path_pattern()
}

proptest! {
    #[test]
    fn only_changed_is_rederived_after_every_update(
        updates in proptest::collection::vec(update_strategy(), 1..12),
    ) {
        let mut config = RunConfigBuilder::new().build();
        for update in &updates {
            config = update_run_config(&config, update);
            prop_assert_eq!(config.only_changed, derived_only_changed(&config));
        }
    }

    #[test]
    fn no_scm_never_clears_once_set(
        updates in proptest::collection::vec(update_strategy(), 1..12),
    ) {
        let mut config = RunConfigBuilder::new().build();
        let mut seen = false;
        for update in &updates {
            config = update_run_config(&config, update);
            seen |= update.no_scm == Some(true);
            prop_assert_eq!(config.no_scm, seen);
        }
    }
}

#[test]
fn startup_forces_only_changed_in_watch_mode() {
    let config = RunConfigBuilder::new().build();
    assert!(config.only_changed);
    assert_eq!(config.test_path_pattern.as_deref(), Some(""));
}

#[test]
fn clear_filters_drops_both_patterns() {
    let config = RunConfigBuilder::new()
        .test_path_pattern("math")
        .test_name_pattern("adds")
        .build();
    assert!(config.has_filters());
    assert!(!config.only_changed);

    let cleared = update_run_config(&config, &ConfigUpdate::clear_filters(WatchMode::Watch));
    assert!(!cleared.has_filters());
    assert!(cleared.only_changed);

    let all = update_run_config(&config, &ConfigUpdate::clear_filters(WatchMode::WatchAll));
    assert!(!all.has_filters());
    assert!(!all.only_changed);
    assert_eq!(all.mode, WatchMode::WatchAll);
}

#[test]
fn empty_update_leaves_everything_but_the_derived_flag() {
    let config = RunConfigBuilder::new()
        .only_failures(true)
        .update_snapshot(UpdateSnapshot::None)
        .build();
    let update = ConfigUpdate::default();
    assert!(update.is_empty());
    assert_eq!(update_run_config(&config, &update), config);
}

#[test]
fn empty_changed_since_clears_the_revision() {
    let config = update_run_config(
        &RunConfigBuilder::new().build(),
        &ConfigUpdate {
            changed_since: Some("main".to_string()),
            ..ConfigUpdate::default()
        },
    );
    assert_eq!(config.changed_since.as_deref(), Some("main"));

    let config = update_run_config(
        &config,
        &ConfigUpdate {
            changed_since: Some(String::new()),
            ..ConfigUpdate::default()
        },
    );
    assert_eq!(config.changed_since, None);
}

#[test]
fn updates_deserialize_from_camel_case_json() {
    let update: ConfigUpdate = serde_json::from_str(
        r#"{"mode": "watchAll", "testPathPattern": "foo", "updateSnapshot": "all"}"#,
    )
    .unwrap();
    assert_eq!(update.mode, Some(WatchMode::WatchAll));
    assert_eq!(update.test_path_pattern.as_deref(), Some("foo"));
    assert_eq!(update.update_snapshot, Some(UpdateSnapshot::All));
}
