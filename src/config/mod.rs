pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_global_settings, load_settings};
pub use paths::{
    default_state_root_path, StatePaths, CACHE_DATABASE_FILE_NAME, DEFAULT_STATE_ROOT_DIR,
    LOG_FILE_NAME, SETTINGS_FILE_NAME,
};
pub use settings::{Settings, DEFAULT_FAN_OUT_CONCURRENCY};
