use super::{CachedResult, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Config,
    Cache,
    CacheTags,
}

impl Namespace {
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Cache => "cache",
            Self::CacheTags => "cache_tags",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub unreadable: usize,
    pub tags: usize,
}

pub struct CacheStore {
    db_path: PathBuf,
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    pub fn new(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            connection: Mutex::new(None),
        }
    }

    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let store = Self::new(db_path);
        store.with_connection(|_| Ok(()))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn get(&self, namespace: Namespace, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_connection(|connection| {
            connection
                .query_row(
                    &format!(
                        "SELECT value FROM {} WHERE key = ?1",
                        namespace.table_name()
                    ),
                    params![key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()
                .map_err(|source| StoreError::Sql { source })
        })
    }

    pub fn set(&self, namespace: Namespace, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    &format!(
                        "
                        INSERT INTO {} (key, value) VALUES (?1, ?2)
                        ON CONFLICT(key) DO UPDATE SET value=excluded.value
                        ",
                        namespace.table_name()
                    ),
                    params![key, value],
                )
                .map_err(|source| StoreError::Sql { source })?;
            Ok(())
        })
    }

    pub fn delete(&self, namespace: Namespace, key: &str) -> Result<bool, StoreError> {
        self.with_connection(|connection| {
            let removed = connection
                .execute(
                    &format!("DELETE FROM {} WHERE key = ?1", namespace.table_name()),
                    params![key],
                )
                .map_err(|source| StoreError::Sql { source })?;
            Ok(removed > 0)
        })
    }

    pub fn put_cache_entry(
        &self,
        key: &str,
        source_key: &str,
        value: &[u8],
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "
                    INSERT INTO cache (key, source_key, value) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        source_key=excluded.source_key,
                        value=excluded.value
                    ",
                    params![key, source_key, value],
                )
                .map_err(|source| StoreError::Sql { source })?;
            Ok(())
        })
    }

    pub fn add_tags(&self, key: &str, tags: &[String]) -> Result<(), StoreError> {
        if tags.is_empty() {
            return Ok(());
        }
        self.with_transaction(|tx| {
            for tag in tags {
                let mut keys = match read_tag_keys(tx, tag) {
                    Ok(keys) => keys.unwrap_or_default(),
                    Err(StoreError::CorruptTagIndex { .. }) => Vec::new(),
                    Err(other) => return Err(other),
                };
                if keys.iter().any(|existing| existing == key) {
                    continue;
                }
                keys.push(key.to_string());
                let encoded =
                    serde_json::to_vec(&keys).map_err(|source| StoreError::Encode { source })?;
                tx.execute(
                    "
                    INSERT INTO cache_tags (key, value) VALUES (?1, ?2)
                    ON CONFLICT(key) DO UPDATE SET value=excluded.value
                    ",
                    params![tag, encoded],
                )
                .map_err(|source| StoreError::Sql { source })?;
            }
            Ok(())
        })
    }

    pub fn tagged_keys(&self, tag: &str) -> Result<Vec<String>, StoreError> {
        self.with_connection(|connection| {
            Ok(read_tag_keys(connection, tag)?.unwrap_or_default())
        })
    }

    pub fn invalidate_tags(&self, tags: &[String]) -> Result<usize, StoreError> {
        if tags.is_empty() {
            return Ok(0);
        }
        self.with_transaction(|tx| {
            let mut keys_to_delete = BTreeSet::new();
            for tag in tags {
                match read_tag_keys(tx, tag) {
                    Ok(Some(keys)) => keys_to_delete.extend(keys),
                    Ok(None) => continue,
                    Err(StoreError::CorruptTagIndex { .. }) => {}
                    Err(other) => return Err(other),
                }
                tx.execute("DELETE FROM cache_tags WHERE key = ?1", params![tag])
                    .map_err(|source| StoreError::Sql { source })?;
            }

            let mut removed = 0usize;
            for key in &keys_to_delete {
                removed += tx
                    .execute("DELETE FROM cache WHERE key = ?1", params![key])
                    .map_err(|source| StoreError::Sql { source })?;
            }
            Ok(removed)
        })
    }

    // tag index entries are left in place
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        self.with_transaction(|tx| {
            let matching = {
                let mut statement = tx
                    .prepare("SELECT key, source_key FROM cache")
                    .map_err(|source| StoreError::Sql { source })?;
                let rows = statement
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
                    })
                    .map_err(|source| StoreError::Sql { source })?;

                let mut matching = Vec::new();
                for row in rows {
                    let (key, source_key) = row.map_err(|source| StoreError::Sql { source })?;
                    let source_matches = source_key
                        .as_deref()
                        .is_some_and(|value| value.starts_with(prefix));
                    if key.starts_with(prefix) || source_matches {
                        matching.push(key);
                    }
                }
                matching
            };

            for key in &matching {
                tx.execute("DELETE FROM cache WHERE key = ?1", params![key])
                    .map_err(|source| StoreError::Sql { source })?;
            }
            Ok(matching.len())
        })
    }

    pub fn prune_expired(&self, ttl: Duration, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_transaction(|tx| {
            let stale = {
                let mut statement = tx
                    .prepare("SELECT key, value FROM cache")
                    .map_err(|source| StoreError::Sql { source })?;
                let rows = statement
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
                    })
                    .map_err(|source| StoreError::Sql { source })?;

                let mut stale = Vec::new();
                for row in rows {
                    let (key, value) = row.map_err(|source| StoreError::Sql { source })?;
                    let fresh = CachedResult::decode(&value)
                        .map(|entry| entry.is_fresh(ttl, now))
                        .unwrap_or(false);
                    if !fresh {
                        stale.push(key);
                    }
                }
                stale
            };

            for key in &stale {
                tx.execute("DELETE FROM cache WHERE key = ?1", params![key])
                    .map_err(|source| StoreError::Sql { source })?;
            }
            Ok(stale.len())
        })
    }

    pub fn clear_cache(&self) -> Result<(), StoreError> {
        self.with_transaction(|tx| {
            tx.execute_batch("DELETE FROM cache; DELETE FROM cache_tags;")
                .map_err(|source| StoreError::Sql { source })
        })
    }

    pub fn stats(&self, ttl: Duration, now: DateTime<Utc>) -> Result<CacheStats, StoreError> {
        self.with_transaction(|tx| {
            let mut stats = CacheStats::default();
            {
                let mut statement = tx
                    .prepare("SELECT value FROM cache")
                    .map_err(|source| StoreError::Sql { source })?;
                let rows = statement
                    .query_map([], |row| row.get::<_, Vec<u8>>(0))
                    .map_err(|source| StoreError::Sql { source })?;
                for row in rows {
                    let value = row.map_err(|source| StoreError::Sql { source })?;
                    stats.entries += 1;
                    match CachedResult::decode(&value) {
                        Ok(entry) if entry.is_fresh(ttl, now) => {}
                        Ok(_) => stats.expired += 1,
                        Err(_) => stats.unreadable += 1,
                    }
                }
            }
            let tags: i64 = tx
                .query_row("SELECT COUNT(*) FROM cache_tags", [], |row| row.get(0))
                .map_err(|source| StoreError::Sql { source })?;
            stats.tags = tags as usize;
            Ok(stats)
        })
    }

    pub fn config_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .get(Namespace::Config, key)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set(Namespace::Config, key, value.as_bytes())
    }

    pub fn remove_config_value(&self, key: &str) -> Result<bool, StoreError> {
        self.delete(Namespace::Config, key)
    }

    pub fn config_entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare("SELECT key, value FROM config ORDER BY key ASC")
                .map_err(|source| StoreError::Sql { source })?;
            let rows = statement
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
                })
                .map_err(|source| StoreError::Sql { source })?;

            let mut out = Vec::new();
            for row in rows {
                let (key, value) = row.map_err(|source| StoreError::Sql { source })?;
                out.push((key, String::from_utf8_lossy(&value).into_owned()));
            }
            Ok(out)
        })
    }

    fn with_transaction<R>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.with_connection(|connection| {
            let tx = connection
                .transaction()
                .map_err(|source| StoreError::Sql { source })?;
            let result = op(&tx)?;
            tx.commit().map_err(|source| StoreError::Sql { source })?;
            Ok(result)
        })
    }

    fn with_connection<R>(
        &self,
        op: impl FnOnce(&mut Connection) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut guard = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut connection = match guard.take() {
            Some(connection) => connection,
            None => self.connect()?,
        };
        let result = op(&mut connection);
        *guard = Some(connection);
        result
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::CreateParent {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let connection = Connection::open(&self.db_path).map_err(|source| StoreError::Open {
            path: self.db_path.display().to_string(),
            source,
        })?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| StoreError::Sql { source })?;
        connection
            .execute_batch(
                "
                PRAGMA journal_mode=WAL;

                CREATE TABLE IF NOT EXISTS config (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL
                );

                CREATE TABLE IF NOT EXISTS cache (
                    key TEXT PRIMARY KEY,
                    source_key TEXT,
                    value BLOB NOT NULL
                );

                CREATE TABLE IF NOT EXISTS cache_tags (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL
                );
                ",
            )
            .map_err(|source| StoreError::Sql { source })?;
        Ok(connection)
    }
}

fn read_tag_keys(connection: &Connection, tag: &str) -> Result<Option<Vec<String>>, StoreError> {
    let raw: Option<Vec<u8>> = connection
        .query_row(
            "SELECT value FROM cache_tags WHERE key = ?1",
            params![tag],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Sql { source })?;

    match raw {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::CorruptTagIndex {
                tag: tag.to_string(),
                source,
            }),
        None => Ok(None),
    }
}
