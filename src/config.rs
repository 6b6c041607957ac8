//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the inspection engine.
///
/// All durations accept humantime strings (`"60s"`, `"5m"`) when
/// deserialized from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum requests per client within the sliding window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u64,

    /// Length of the sliding window.
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,

    /// Block duration applied when a client exceeds the rate limit.
    #[serde(default = "default_rate_limit_block", with = "humantime_serde")]
    pub rate_limit_block: Duration,

    /// Block duration applied when a blocking rule matches.
    #[serde(default = "default_rule_block", with = "humantime_serde")]
    pub rule_block: Duration,

    /// Period of the background sweep that evicts expired state.
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Whether to seed the engine with the baseline rule set.
    #[serde(default = "default_use_default_rules")]
    pub use_default_rules: bool,
}

fn default_rate_limit() -> u64 {
    100
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_rate_limit_block() -> Duration {
    Duration::from_secs(30)
}

fn default_rule_block() -> Duration {
    Duration::from_secs(60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_use_default_rules() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            window: default_window(),
            rate_limit_block: default_rate_limit_block(),
            rule_block: default_rule_block(),
            sweep_interval: default_sweep_interval(),
            use_default_rules: default_use_default_rules(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum requests per window.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: u64) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the sliding-window length.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the block duration for rate-limit violations.
    #[must_use]
    pub fn with_rate_limit_block(mut self, duration: Duration) -> Self {
        self.rate_limit_block = duration;
        self
    }

    /// Set the block duration for rule matches.
    #[must_use]
    pub fn with_rule_block(mut self, duration: Duration) -> Self {
        self.rule_block = duration;
        self
    }

    /// Set the background sweep period.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Start the engine without the baseline rule set.
    #[must_use]
    pub fn without_default_rules(mut self) -> Self {
        self.use_default_rules = false;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit == 0 {
            return Err("rate_limit must be greater than 0".to_string());
        }

        if self.window.is_zero() {
            return Err("window must be greater than 0".to_string());
        }

        if self.rate_limit_block.is_zero() {
            return Err("rate_limit_block must be greater than 0".to_string());
        }

        if self.rule_block.is_zero() {
            return Err("rule_block must be greater than 0".to_string());
        }

        if self.sweep_interval.is_zero() {
            return Err("sweep_interval must be greater than 0".to_string());
        }

        Ok(())
    }
}
