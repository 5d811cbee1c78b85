use crate::config::{load_settings, ConfigError, Settings, StatePaths};
use crate::store::CacheStore;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn ensure_state_root() -> Result<StatePaths, String> {
    let paths = StatePaths::from_home().map_err(map_config_err)?;
    paths.bootstrap().map_err(map_config_err)?;
    Ok(paths)
}

pub fn open_store(paths: &StatePaths) -> Result<CacheStore, String> {
    CacheStore::open(&paths.cache_database()).map_err(|e| e.to_string())
}

pub fn load_state_settings(paths: &StatePaths) -> Result<Settings, String> {
    load_settings(paths).map_err(map_config_err)
}
