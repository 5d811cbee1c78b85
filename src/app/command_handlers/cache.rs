use crate::app::command_support::{ensure_state_root, open_store};
use crate::config::StatePaths;
use crate::executor::invalidate;
use crate::store::DEFAULT_CACHE_TTL;
use chrono::Utc;

pub fn cmd_cache(args: &[String]) -> Result<String, String> {
    let paths = ensure_state_root()?;
    cache_command(&paths, args)
}

pub fn cache_command(paths: &StatePaths, args: &[String]) -> Result<String, String> {
    let Some(subcommand) = args.first() else {
        return Err(usage());
    };
    let store = open_store(paths)?;

    match subcommand.as_str() {
        "status" => {
            let stats = store
                .stats(DEFAULT_CACHE_TTL, Utc::now())
                .map_err(|e| e.to_string())?;
            Ok(format!(
                "path={}\nentries={}\nexpired={}\nunreadable={}\ntags={}",
                store.path().display(),
                stats.entries,
                stats.expired,
                stats.unreadable,
                stats.tags
            ))
        }
        "prune" => {
            let removed = store
                .prune_expired(DEFAULT_CACHE_TTL, Utc::now())
                .map_err(|e| e.to_string())?;
            Ok(format!("pruned={removed}"))
        }
        "clear" => {
            store.clear_cache().map_err(|e| e.to_string())?;
            Ok("cache cleared".to_string())
        }
        "invalidate" => {
            let tags = &args[1..];
            if tags.is_empty() {
                return Err("usage: cache invalidate <tag>...".to_string());
            }
            let report = invalidate(&store, tags);
            if !report.is_clean() {
                return Err(format!(
                    "invalidation failed after removing {} entries: {}",
                    report.removed,
                    report.failures.join("; ")
                ));
            }
            Ok(format!("invalidated={}", report.removed))
        }
        _ => Err(usage()),
    }
}

fn usage() -> String {
    "usage: cache [status|prune|clear|invalidate <tag>...]".to_string()
}
