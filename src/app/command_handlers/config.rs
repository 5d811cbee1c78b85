use crate::app::command_support::{ensure_state_root, load_state_settings, open_store};
use crate::config::StatePaths;

pub fn cmd_config(args: &[String]) -> Result<String, String> {
    let paths = ensure_state_root()?;
    config_command(&paths, args)
}

pub fn config_command(paths: &StatePaths, args: &[String]) -> Result<String, String> {
    let store = open_store(paths)?;

    match args {
        [] => Err(usage()),
        [verb] if verb == "show" => {
            let settings = load_state_settings(paths)?;
            let mut lines = vec![
                format!("caching={}", settings.caching),
                format!("fan_out_concurrency={}", settings.fan_out_concurrency),
            ];
            for (key, value) in store.config_entries().map_err(|e| e.to_string())? {
                lines.push(format!("{key}={value}"));
            }
            Ok(lines.join("\n"))
        }
        [verb, key] if verb == "get" => match store.config_value(key).map_err(|e| e.to_string())? {
            Some(value) => Ok(value),
            None => Err(format!("config key `{key}` is not set")),
        },
        [verb, key, value] if verb == "set" => {
            store
                .set_config_value(key, value)
                .map_err(|e| e.to_string())?;
            Ok(format!("{key}={value}"))
        }
        [verb, key] if verb == "unset" => {
            let removed = store
                .remove_config_value(key)
                .map_err(|e| e.to_string())?;
            if removed {
                Ok(format!("removed {key}"))
            } else {
                Err(format!("config key `{key}` is not set"))
            }
        }
        _ => Err(usage()),
    }
}

fn usage() -> String {
    "usage: config [show|get <key>|set <key> <value>|unset <key>]".to_string()
}
