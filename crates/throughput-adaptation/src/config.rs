//! Adaptation engine configuration

use crate::error::{AdaptationError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default bandwidth history capacity
pub const DEFAULT_BANDWIDTH_SAMPLES: usize = 30;

/// Default geometric ratio of the bandwidth weight table
pub const DEFAULT_SMOOTHING_RATIO: f64 = 0.75;

/// Default pivot window capacity
pub const DEFAULT_PIVOT_SAMPLES: usize = 5;

/// Environment variable prefix used by [`AdaptationConfig::load`]
pub const ENV_PREFIX: &str = "ADAPT";

/// Tunables for the estimation engine and its tick loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    /// Number of instantaneous throughput values kept for smoothing (default: 30)
    pub bandwidth_samples: usize,

    /// Geometric decay of the smoothing weights, in (0, 1) (default: 0.75)
    pub smoothing_ratio: f64,

    /// Number of throughput values kept around trend reversals (default: 5)
    pub pivot_samples: usize,

    /// Tick period in milliseconds (default: 5000)
    pub tick_period_ms: u64,

    /// Minimum spacing between accepted drain events in milliseconds (default: 10000)
    pub debounce_interval_ms: u64,

    /// Floor applied to the elapsed time between ticks, in microseconds (default: 1000)
    pub min_elapsed_us: u64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            bandwidth_samples: DEFAULT_BANDWIDTH_SAMPLES,
            smoothing_ratio: DEFAULT_SMOOTHING_RATIO,
            pivot_samples: DEFAULT_PIVOT_SAMPLES,
            tick_period_ms: 5_000,
            debounce_interval_ms: 10_000,
            min_elapsed_us: 1_000,
        }
    }
}

impl AdaptationConfig {
    /// Load configuration from `ADAPT_*` environment variables
    ///
    /// Unset keys keep their defaults.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Self::finish(config)
    }

    /// Load configuration from a file, overridden by `ADAPT_*` environment variables
    ///
    /// The file format is picked from the extension (toml, json, yaml, ...).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Self::finish(config)
    }

    fn finish(config: config::Config) -> Result<Self> {
        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check that every value is usable by the engine
    pub fn validate(&self) -> Result<()> {
        if self.bandwidth_samples == 0 {
            return Err(AdaptationError::InvalidConfig(
                "bandwidth_samples must be at least 1".to_string(),
            ));
        }
        if self.pivot_samples == 0 {
            return Err(AdaptationError::InvalidConfig(
                "pivot_samples must be at least 1".to_string(),
            ));
        }
        if !self.smoothing_ratio.is_finite()
            || self.smoothing_ratio <= 0.0
            || self.smoothing_ratio >= 1.0
        {
            return Err(AdaptationError::InvalidConfig(format!(
                "smoothing_ratio must be in (0, 1), got {}",
                self.smoothing_ratio
            )));
        }
        if self.tick_period_ms == 0 {
            return Err(AdaptationError::InvalidConfig(
                "tick_period_ms must be positive".to_string(),
            ));
        }
        if self.min_elapsed_us == 0 {
            return Err(AdaptationError::InvalidConfig(
                "min_elapsed_us must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }

    pub fn min_elapsed(&self) -> Duration {
        Duration::from_micros(self.min_elapsed_us)
    }

    /// Set the bandwidth history capacity
    pub fn with_bandwidth_samples(mut self, samples: usize) -> Self {
        self.bandwidth_samples = samples;
        self
    }

    /// Set the smoothing ratio
    pub fn with_smoothing_ratio(mut self, ratio: f64) -> Self {
        self.smoothing_ratio = ratio;
        self
    }

    /// Set the pivot window capacity
    pub fn with_pivot_samples(mut self, samples: usize) -> Self {
        self.pivot_samples = samples;
        self
    }

    /// Set the tick period
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = period.as_millis() as u64;
        self
    }

    /// Set the drain debounce interval
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the elapsed-time floor
    pub fn with_min_elapsed(mut self, floor: Duration) -> Self {
        self.min_elapsed_us = floor.as_micros() as u64;
        self
    }
}
