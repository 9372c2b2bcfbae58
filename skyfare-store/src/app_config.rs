use std::env;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub search: SearchRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Tunables for the search pipeline. Defaults mirror the live service;
/// tests shrink the delays and ceilings to keep runs fast.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchRules {
    /// How long replay history outlives the last append.
    #[serde(default = "default_result_ttl")]
    pub result_ttl_seconds: u64,
    /// Total advertised to clients when computing displayed percentage.
    #[serde(default = "default_expected_flights")]
    pub expected_flights: u64,
    #[serde(default = "default_flights_min")]
    pub flights_per_source_min: u32,
    #[serde(default = "default_flights_max")]
    pub flights_per_source_max: u32,
    /// Simulated network jitter bounds per produced event.
    #[serde(default = "default_delay_min")]
    pub delay_min_ms: u64,
    #[serde(default = "default_delay_max")]
    pub delay_max_ms: u64,
    /// Poll transport re-check cadence and wait ceiling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
    /// Maximum lifetime of one push connection, independent of the search.
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_seconds: u64,
}

fn default_result_ttl() -> u64 {
    1800
}
fn default_expected_flights() -> u64 {
    24
}
fn default_flights_min() -> u32 {
    8
}
fn default_flights_max() -> u32 {
    10
}
fn default_delay_min() -> u64 {
    10
}
fn default_delay_max() -> u64 {
    710
}
fn default_poll_interval() -> u64 {
    500
}
fn default_poll_timeout() -> u64 {
    300
}
fn default_stream_timeout() -> u64 {
    300
}

impl Default for SearchRules {
    fn default() -> Self {
        Self {
            result_ttl_seconds: default_result_ttl(),
            expected_flights: default_expected_flights(),
            flights_per_source_min: default_flights_min(),
            flights_per_source_max: default_flights_max(),
            delay_min_ms: default_delay_min(),
            delay_max_ms: default_delay_max(),
            poll_interval_ms: default_poll_interval(),
            poll_timeout_seconds: default_poll_timeout(),
            stream_timeout_seconds: default_stream_timeout(),
        }
    }
}

impl SearchRules {
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }

    pub fn stream_ceiling(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Env overrides, e.g. SKYFARE__SERVER__PORT=8080
            .add_source(config::Environment::with_prefix("SKYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_rules_defaults_match_live_service() {
        let rules = SearchRules::default();
        assert_eq!(rules.expected_flights, 24);
        assert_eq!(rules.flights_per_source_min, 8);
        assert_eq!(rules.flights_per_source_max, 10);
        assert_eq!(rules.result_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(rules.poll_interval(), Duration::from_millis(500));
        assert_eq!(rules.poll_ceiling(), Duration::from_secs(5 * 60));
        assert_eq!(rules.stream_ceiling(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn test_partial_search_section_fills_defaults() {
        let rules: SearchRules = serde_json::from_str(r#"{"delay_min_ms": 1, "delay_max_ms": 5}"#)
            .expect("deserialize");
        assert_eq!(rules.delay_min_ms, 1);
        assert_eq!(rules.delay_max_ms, 5);
        assert_eq!(rules.expected_flights, 24);
    }
}
