//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

use crate::cache::{DEFAULT_LOCK_STRIPES, DEFAULT_MIN_HITS, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

/// Envelope cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Treat logically expired entries as absent on fetch
    pub enforce_expiry_on_fetch: bool,
    /// Background sweep task interval in seconds
    pub sweep_interval: u64,
    /// Hit threshold at or below which purge removes an entry
    pub purge_min_hits: u64,
    /// Maximum key length in bytes
    pub max_key_length: usize,
    /// Maximum encoded envelope size in bytes
    pub max_value_size: usize,
    /// Number of per-key lock stripes
    pub lock_stripes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ENFORCE_EXPIRY_ON_FETCH` - Hide logically expired entries (default: false)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `PURGE_MIN_HITS` - Purge threshold (default: 10)
    /// - `MAX_KEY_LENGTH` - Key length limit in bytes (default: 256)
    /// - `MAX_VALUE_SIZE` - Envelope size limit in bytes (default: 1 MiB)
    /// - `LOCK_STRIPES` - Per-key lock stripes (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enforce_expiry_on_fetch: env::var("ENFORCE_EXPIRY_ON_FETCH")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.enforce_expiry_on_fetch),
            sweep_interval: env_parse("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            purge_min_hits: env_parse("PURGE_MIN_HITS").unwrap_or(defaults.purge_min_hits),
            max_key_length: env_parse("MAX_KEY_LENGTH").unwrap_or(defaults.max_key_length),
            max_value_size: env_parse("MAX_VALUE_SIZE").unwrap_or(defaults.max_value_size),
            lock_stripes: env_parse::<usize>("LOCK_STRIPES")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.lock_stripes),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enforce_expiry_on_fetch: false,
            sweep_interval: 60,
            purge_min_hits: DEFAULT_MIN_HITS,
            max_key_length: MAX_KEY_LENGTH,
            max_value_size: MAX_VALUE_SIZE,
            lock_stripes: DEFAULT_LOCK_STRIPES,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
