use super::{ConfigError, Settings, StatePaths};

pub fn load_global_settings() -> Result<Settings, ConfigError> {
    let paths = StatePaths::from_home()?;
    load_settings(&paths)
}

pub fn load_settings(paths: &StatePaths) -> Result<Settings, ConfigError> {
    let path = paths.settings_file();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let settings = Settings::from_path(&path)?;
    settings.validate()?;
    Ok(settings)
}
