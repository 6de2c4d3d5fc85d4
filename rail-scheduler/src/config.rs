//! Scheduler configuration.

use chrono::Duration;
use tracing::warn;

/// Configuration parameters for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Size of the capacity analysis windows (minutes).
    pub capacity_window_mins: u32,

    /// How long a computed route stays cached (seconds).
    pub route_cache_ttl_secs: u64,

    /// Maximum number of cached routes.
    pub route_cache_capacity: u64,

    /// How far ahead the upcoming capacity report looks (minutes).
    pub upcoming_horizon_mins: i64,
}

impl SchedulerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        capacity_window_mins: u32,
        route_cache_ttl_secs: u64,
        route_cache_capacity: u64,
        upcoming_horizon_mins: i64,
    ) -> Self {
        Self {
            capacity_window_mins,
            route_cache_ttl_secs,
            route_cache_capacity,
            upcoming_horizon_mins,
        }
    }

    /// Read the configuration from `RAIL_*` environment variables.
    ///
    /// Missing variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            capacity_window_mins: parse_var(
                &lookup,
                "RAIL_CAPACITY_WINDOW_MINS",
                defaults.capacity_window_mins,
            ),
            route_cache_ttl_secs: parse_var(
                &lookup,
                "RAIL_ROUTE_CACHE_TTL_SECS",
                defaults.route_cache_ttl_secs,
            ),
            route_cache_capacity: parse_var(
                &lookup,
                "RAIL_ROUTE_CACHE_CAPACITY",
                defaults.route_cache_capacity,
            ),
            upcoming_horizon_mins: parse_var(
                &lookup,
                "RAIL_UPCOMING_HORIZON_MINS",
                defaults.upcoming_horizon_mins,
            ),
        }
    }

    /// Returns the route cache TTL as a std Duration.
    pub fn route_cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.route_cache_ttl_secs)
    }

    /// Returns the upcoming report horizon as a Duration.
    pub fn upcoming_horizon(&self) -> Duration {
        Duration::minutes(self.upcoming_horizon_mins)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity_window_mins: 30,
            route_cache_ttl_secs: 300, // 5 minutes
            route_cache_capacity: 1024,
            upcoming_horizon_mins: 120, // 2 hours
        }
    }
}

fn parse_var<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparsable configuration value");
                default
            }
        },
    }
}
