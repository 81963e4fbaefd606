//! bestfit.toml selector configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::region;

/// Longest accepted cache TTL: one week.
pub const MAX_CACHE_TTL_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted spot-history window: the 90 days providers retain.
pub const MAX_SPOT_WINDOW_HOURS: u64 = 90 * 24;

/// Construction-time settings of a selector.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    pub region: String,
    /// Concurrent spot-history lookups per batch.
    pub describe_spot_price_history_concurrency: usize,
    /// Concurrent on-demand price lookups per batch.
    pub describe_on_demand_price_concurrency: usize,
    pub cache_ttl_in_minutes: u64,
    /// Trailing window of spot history considered per lookup.
    pub spot_price_history_window_hours: u64,
    /// Pass the request's product descriptions to spot-history lookups.
    pub spot_uses_product_descriptions: bool,
    /// Abort a whole selection call after this many seconds.
    pub selection_timeout_secs: Option<u64>,
    pub retry: RetryConfig,
}

/// Backoff applied to transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            describe_spot_price_history_concurrency: 10,
            describe_on_demand_price_concurrency: 10,
            cache_ttl_in_minutes: 120,
            spot_price_history_window_hours: 24,
            spot_uses_product_descriptions: true,
            selection_timeout_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl SelectorConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: SelectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration for another region.
    pub fn for_region(region: &str) -> Self {
        Self {
            region: region.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !region::is_known_region(&self.region) {
            return Err(ConfigError::UnknownRegion(self.region.clone()));
        }
        if self.describe_spot_price_history_concurrency == 0 {
            return Err(ConfigError::Zero("describe_spot_price_history_concurrency"));
        }
        if self.describe_on_demand_price_concurrency == 0 {
            return Err(ConfigError::Zero("describe_on_demand_price_concurrency"));
        }
        if self.cache_ttl_in_minutes == 0 {
            return Err(ConfigError::Zero("cache_ttl_in_minutes"));
        }
        check_at_most("cache_ttl_in_minutes", self.cache_ttl_in_minutes, MAX_CACHE_TTL_MINUTES)?;
        check_at_most(
            "spot_price_history_window_hours",
            self.spot_price_history_window_hours,
            MAX_SPOT_WINDOW_HOURS,
        )?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("retry.max_attempts"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_in_minutes.saturating_mul(60))
    }

    pub fn spot_price_history_window(&self) -> Duration {
        Duration::from_secs(self.spot_price_history_window_hours.saturating_mul(3600))
    }

    pub fn selection_timeout(&self) -> Option<Duration> {
        self.selection_timeout_secs.map(Duration::from_secs)
    }
}

fn check_at_most(field: &'static str, value: u64, max: u64) -> ConfigResult<()> {
    if value > max {
        return Err(ConfigError::OutOfRange { field, value, max });
    }
    Ok(())
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), doubling up to the cap.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
