use std::str::FromStr;

/// Handoff service configuration loaded from environment variables.
#[derive(Debug)]
pub struct HandoffConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3114). Env var: `HANDOFF_PORT`.
    pub handoff_port: u16,
    /// Pickup code lifetime in seconds (default 900). Env var: `PICKUP_CODE_TTL_SECS`.
    pub pickup_code_ttl_secs: i64,
    /// Delivery code lifetime in seconds (default 1800). Env var: `DELIVERY_CODE_TTL_SECS`.
    /// Must be longer than the pickup lifetime.
    pub delivery_code_ttl_secs: i64,
    /// Per-order buffer of undelivered change events before slow subscribers lag
    /// (default 64). Env var: `EVENT_BUFFER`.
    pub event_buffer: usize,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl HandoffConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok()).expect("invalid handoff configuration")
    }

    /// Build the config from any key lookup. A variable that is set but does not parse is
    /// an error, never the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            handoff_port: parse_or(&lookup, "HANDOFF_PORT", 3114)?,
            pickup_code_ttl_secs: parse_or(&lookup, "PICKUP_CODE_TTL_SECS", 900)?,
            delivery_code_ttl_secs: parse_or(&lookup, "DELIVERY_CODE_TTL_SECS", 1800)?,
            event_buffer: parse_or(&lookup, "EVENT_BUFFER", 64)?,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
