use crate::config::ConfigError;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_STATE_ROOT_DIR: &str = ".cmdflow";
pub const SETTINGS_FILE_NAME: &str = "config.yaml";
pub const CACHE_DATABASE_FILE_NAME: &str = "cache.db";
pub const LOG_FILE_NAME: &str = "cmdflow.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_home() -> Result<Self, ConfigError> {
        default_state_root_path().map(Self::new)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    pub fn cache_database(&self) -> PathBuf {
        self.root.join(CACHE_DATABASE_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        vec![self.root.clone(), self.logs_dir()]
    }

    pub fn bootstrap(&self) -> Result<(), ConfigError> {
        for path in self.required_directories() {
            fs::create_dir_all(&path).map_err(|source| ConfigError::CreateDir {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

pub fn default_state_root_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(DEFAULT_STATE_ROOT_DIR))
}
