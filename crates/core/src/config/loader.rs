use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `READTREND_TRENDING__DECAY__DECAY_RATE`.
pub const ENV_PREFIX: &str = "READTREND_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        // Unprefixed names still set by older deployments
        .merge(
            Env::raw()
                .only(&["WINDOW_HOURS"])
                .map(|_| "trending.aggregator.window_hours".into()),
        )
        .merge(
            Env::raw()
                .only(&["SEARCH_EVENTS_RETENTION_DAYS"])
                .map(|_| "trending.retention.retention_days".into()),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}
