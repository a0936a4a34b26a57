mod types;

pub use types::*;

use std::path::Path;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./aniview.toml",
        "~/.config/aniview/config.toml",
        "/etc/aniview/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
///
/// Every TTL and refresh interval must be positive; a zero TTL would create
/// entries that are expired at birth, and a zero interval would busy-loop the
/// updater.
fn validate_config(config: &Config) -> Result<()> {
    let ttls = [
        ("cache.trending_ttl_secs", config.cache.trending_ttl_secs),
        ("cache.details_ttl_secs", config.cache.details_ttl_secs),
        ("cache.episodes_ttl_secs", config.cache.episodes_ttl_secs),
        ("cache.default_ttl_secs", config.cache.default_ttl_secs),
        (
            "updater.trending_interval_secs",
            config.updater.trending_interval_secs,
        ),
        (
            "updater.details_interval_secs",
            config.updater.details_interval_secs,
        ),
        (
            "updater.episodes_interval_secs",
            config.updater.episodes_interval_secs,
        ),
    ];
    for (name, value) in ttls {
        if value == 0 {
            return Err(Error::invalid_config(format!("{name} cannot be 0")));
        }
    }

    if config.cache.stale_window_secs == 0 {
        return Err(Error::invalid_config("cache.stale_window_secs cannot be 0"));
    }

    if config.updater.trending_per_page == 0 {
        return Err(Error::invalid_config(
            "updater.trending_per_page cannot be 0",
        ));
    }

    Ok(())
}
