use chrono::Utc;
use cmdflow::app::command_handlers::cache::cache_command;
use cmdflow::app::command_handlers::config::config_command;
use cmdflow::app::command_handlers::run_cli;
use cmdflow::config::StatePaths;
use cmdflow::store::{CacheStore, CachedResult};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn seed(paths: &StatePaths, key: &str, source: &str) {
    let store = CacheStore::open(&paths.cache_database()).expect("open store");
    let entry = CachedResult::new(json!({"records": []}), Utc::now())
        .encode()
        .expect("encode");
    store.put_cache_entry(key, source, &entry).expect("put");
    store
        .add_tags(key, &[source.to_string()])
        .expect("tag");
}

#[test]
fn run_cli_without_arguments_prints_help() {
    let help = run_cli(Vec::new()).expect("help");
    assert!(help.contains("cache invalidate <tag>..."));
    assert!(help.contains("config set <key> <value>"));
}

#[test]
fn run_cli_rejects_unknown_commands() {
    let err = run_cli(args(&["zones"])).expect_err("unknown command");
    assert_eq!(err, "unknown command `zones`");
}

#[test]
fn cache_status_prune_and_clear_report_counts() {
    let temp = tempdir().expect("tempdir");
    let paths = StatePaths::new(temp.path());
    seed(&paths, "k1", "zones:list");
    seed(&paths, "k2", "accounts:list");

    let status = cache_command(&paths, &args(&["status"])).expect("status");
    assert!(status.contains("entries=2"));
    assert!(status.contains("tags=2"));

    assert_eq!(
        cache_command(&paths, &args(&["prune"])).expect("prune"),
        "pruned=0"
    );
    assert_eq!(
        cache_command(&paths, &args(&["clear"])).expect("clear"),
        "cache cleared"
    );
    let status = cache_command(&paths, &args(&["status"])).expect("status");
    assert!(status.contains("entries=0"));
}

#[test]
fn cache_invalidate_accepts_exact_and_prefix_tags() {
    let temp = tempdir().expect("tempdir");
    let paths = StatePaths::new(temp.path());
    seed(&paths, "k1", "zones:list");
    seed(&paths, "k2", "zone:abc:records");
    seed(&paths, "k3", "zone:xyz:records");

    let output = cache_command(&paths, &args(&["invalidate", "zones:list", "zone:abc:"]))
        .expect("invalidate");
    assert_eq!(output, "invalidated=2");

    let status = cache_command(&paths, &args(&["status"])).expect("status");
    assert!(status.contains("entries=1"));
}

#[test]
fn cache_subcommands_validate_usage() {
    let temp = tempdir().expect("tempdir");
    let paths = StatePaths::new(temp.path());

    assert_eq!(
        cache_command(&paths, &args(&["invalidate"])).expect_err("no tags"),
        "usage: cache invalidate <tag>..."
    );
    assert!(cache_command(&paths, &args(&["bogus"]))
        .expect_err("bogus")
        .starts_with("usage: cache"));
}

#[test]
fn config_values_round_trip_through_the_cli() {
    let temp = tempdir().expect("tempdir");
    let paths = StatePaths::new(temp.path());
    fs::write(paths.settings_file(), "caching: false\n").expect("write settings");

    assert_eq!(
        config_command(&paths, &args(&["set", "account_id", "acc-1"])).expect("set"),
        "account_id=acc-1"
    );
    assert_eq!(
        config_command(&paths, &args(&["get", "account_id"])).expect("get"),
        "acc-1"
    );

    let shown = config_command(&paths, &args(&["show"])).expect("show");
    assert_eq!(
        shown,
        "caching=false\nfan_out_concurrency=10\naccount_id=acc-1"
    );

    assert_eq!(
        config_command(&paths, &args(&["unset", "account_id"])).expect("unset"),
        "removed account_id"
    );
    assert_eq!(
        config_command(&paths, &args(&["get", "account_id"])).expect_err("unset key"),
        "config key `account_id` is not set"
    );
}
