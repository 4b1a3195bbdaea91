//! Server configuration read from the environment.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_INACTIVITY_HOURS: u64 = 12;

/// Settings for the web binary.
///
/// - `HOST`, `PORT`: bind address (default `0.0.0.0:8080`)
/// - `INACTIVITY_TIMEOUT_HOURS`: tournaments untouched this long are removed (default 12)
/// - `RNG_SEED`: seed every tournament's random source with this value instead of entropy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub inactivity_timeout: Duration,
    pub rng_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            inactivity_timeout: Duration::from_secs(DEFAULT_INACTIVITY_HOURS * 3600),
            rng_seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let hours = lookup("INACTIVITY_TIMEOUT_HOURS").and_then(|h| h.parse::<u64>().ok());
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            inactivity_timeout: hours
                .map(|h| Duration::from_secs(h * 3600))
                .unwrap_or(defaults.inactivity_timeout),
            rng_seed: lookup("RNG_SEED").and_then(|s| s.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        assert_eq!(ServerConfig::from_lookup(|_| None), ServerConfig::default());
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("HOST", "127.0.0.1"),
            ("PORT", "not-a-port"),
            ("INACTIVITY_TIMEOUT_HOURS", "2"),
            ("RNG_SEED", "42"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.inactivity_timeout, Duration::from_secs(7200));
        assert_eq!(config.rng_seed, Some(42));
    }
}
