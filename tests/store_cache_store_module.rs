use chrono::{Duration as ChronoDuration, Utc};
use cmdflow::store::{CacheStore, CachedResult, Namespace, DEFAULT_CACHE_TTL};
use serde_json::json;
use tempfile::tempdir;

fn entry_bytes(age_secs: i64) -> Vec<u8> {
    CachedResult::new(
        json!({"accounts": ["a"]}),
        Utc::now() - ChronoDuration::seconds(age_secs),
    )
    .encode()
    .expect("encode entry")
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn store_creates_parent_directories_and_round_trips_values() {
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("nested/state/cache.db");
    let store = CacheStore::open(&db_path).expect("open store");
    assert!(db_path.exists());

    store
        .set(Namespace::Config, "account_id", b"acc-1")
        .expect("set");
    assert_eq!(
        store.get(Namespace::Config, "account_id").expect("get"),
        Some(b"acc-1".to_vec())
    );
    assert_eq!(store.get(Namespace::Cache, "account_id").expect("get"), None);
    assert!(store.delete(Namespace::Config, "account_id").expect("delete"));
    assert!(!store.delete(Namespace::Config, "account_id").expect("delete"));
}

#[test]
fn store_reopens_existing_file_with_previous_entries() {
    let temp = tempdir().expect("tempdir");
    let db_path = temp.path().join("cache.db");
    {
        let store = CacheStore::open(&db_path).expect("open store");
        store
            .put_cache_entry("k1", "accounts:list", &entry_bytes(0))
            .expect("put");
    }

    let reopened = CacheStore::open(&db_path).expect("reopen");
    assert!(reopened
        .get(Namespace::Cache, "k1")
        .expect("get")
        .is_some());
}

#[test]
fn add_tags_keeps_each_key_once() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");

    store.add_tags("k1", &tags(&["zones:list"])).expect("tag");
    store.add_tags("k1", &tags(&["zones:list"])).expect("tag");
    store.add_tags("k2", &tags(&["zones:list"])).expect("tag");

    assert_eq!(
        store.tagged_keys("zones:list").expect("keys"),
        vec!["k1".to_string(), "k2".to_string()]
    );
    assert!(store.tagged_keys("unknown").expect("keys").is_empty());
}

#[test]
fn invalidating_a_tag_removes_only_its_keys() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");
    for (key, tag) in [("k1", "zones:list"), ("k2", "accounts:list")] {
        store.put_cache_entry(key, tag, &entry_bytes(0)).expect("put");
        store.add_tags(key, &tags(&[tag])).expect("tag");
    }

    let removed = store
        .invalidate_tags(&tags(&["zones:list", "never-used"]))
        .expect("invalidate");

    assert_eq!(removed, 1);
    assert_eq!(store.get(Namespace::Cache, "k1").expect("get"), None);
    assert!(store.get(Namespace::Cache, "k2").expect("get").is_some());
    assert!(store.tagged_keys("zones:list").expect("keys").is_empty());
    assert_eq!(
        store.tagged_keys("accounts:list").expect("keys"),
        vec!["k2".to_string()]
    );
}

#[test]
fn corrupt_tag_index_is_dropped_on_invalidation() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");
    store
        .set(Namespace::CacheTags, "zones:list", b"{not a list")
        .expect("set corrupt tag");

    assert_eq!(
        store.invalidate_tags(&tags(&["zones:list"])).expect("invalidate"),
        0
    );
    assert_eq!(
        store.get(Namespace::CacheTags, "zones:list").expect("get"),
        None
    );
}

#[test]
fn prefix_invalidation_matches_readable_source_keys() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");
    store
        .put_cache_entry("h1", "zone:abc:records", &entry_bytes(0))
        .expect("put");
    store
        .put_cache_entry("h2", "zone:abc:settings", &entry_bytes(0))
        .expect("put");
    store
        .put_cache_entry("h3", "zone:abd:records", &entry_bytes(0))
        .expect("put");
    store
        .add_tags("h1", &tags(&["zone:abc:records"]))
        .expect("tag");

    assert_eq!(store.invalidate_prefix("zone:abc:").expect("prefix"), 2);
    assert_eq!(store.get(Namespace::Cache, "h1").expect("get"), None);
    assert_eq!(store.get(Namespace::Cache, "h2").expect("get"), None);
    assert!(store.get(Namespace::Cache, "h3").expect("get").is_some());
    // prefix invalidation leaves the tag index alone
    assert_eq!(
        store.tagged_keys("zone:abc:records").expect("keys"),
        vec!["h1".to_string()]
    );
}

#[test]
fn prune_and_stats_account_for_expired_and_unreadable_entries() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");
    let ttl_secs = DEFAULT_CACHE_TTL.as_secs() as i64;
    store.put_cache_entry("fresh", "a", &entry_bytes(10)).expect("put");
    store
        .put_cache_entry("stale", "b", &entry_bytes(ttl_secs + 60))
        .expect("put");
    store.put_cache_entry("junk", "c", b"not json").expect("put");
    store.add_tags("fresh", &tags(&["a"])).expect("tag");

    let stats = store.stats(DEFAULT_CACHE_TTL, Utc::now()).expect("stats");
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.unreadable, 1);
    assert_eq!(stats.tags, 1);

    assert_eq!(
        store
            .prune_expired(DEFAULT_CACHE_TTL, Utc::now())
            .expect("prune"),
        2
    );
    assert!(store.get(Namespace::Cache, "fresh").expect("get").is_some());

    store.clear_cache().expect("clear");
    let stats = store.stats(DEFAULT_CACHE_TTL, Utc::now()).expect("stats");
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.tags, 0);
}

#[test]
fn config_values_live_in_their_own_namespace() {
    let temp = tempdir().expect("tempdir");
    let store = CacheStore::open(&temp.path().join("cache.db")).expect("open store");
    store.set_config_value("account_id", "acc-1").expect("set");
    store.set_config_value("output", "json").expect("set");
    store.clear_cache().expect("clear cache");

    assert_eq!(
        store.config_value("account_id").expect("get"),
        Some("acc-1".to_string())
    );
    assert_eq!(
        store.config_entries().expect("entries"),
        vec![
            ("account_id".to_string(), "acc-1".to_string()),
            ("output".to_string(), "json".to_string()),
        ]
    );
    assert!(store.remove_config_value("output").expect("remove"));
    assert_eq!(store.config_value("output").expect("get"), None);
}
