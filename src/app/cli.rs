#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Cache,
    Config,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "cache" => CliVerb::Cache,
        "config" => CliVerb::Config,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  cache status                         Show cache entry, expiry and tag counts"
            .to_string(),
        "  cache prune                          Delete expired cache entries".to_string(),
        "  cache clear                          Delete every cache entry and tag".to_string(),
        "  cache invalidate <tag>...            Invalidate tags (`zone:` clears a prefix)"
            .to_string(),
        "  config show                          Show settings and stored values".to_string(),
        "  config get <key>                     Print one stored value".to_string(),
        "  config set <key> <value>             Store a value".to_string(),
        "  config unset <key>                   Remove a stored value".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}
