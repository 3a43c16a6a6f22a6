//! Exponential backoff with symmetric jitter.

use std::time::Duration;

use rand::RngExt;

use tourhub_core::config::queue::RetryConfig;

/// `delay = min(base * multiplier^retry_count, max)`, perturbed by up to
/// `±jitter_ratio` and clamped to `[0, max]`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Fraction of the delay used as jitter range, in `[0, 1]`.
    pub jitter_ratio: f64,
    /// Default `max_retries` for new records.
    pub max_retries: i32,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            base_delay: Duration::from_secs(config.base_delay_seconds),
            multiplier: config.backoff_multiplier.max(1.0),
            max_delay: Duration::from_secs(config.max_delay_seconds),
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
            max_retries: config.max_retries.max(0),
        }
    }

    /// Delay before the next attempt, without jitter.
    pub fn nominal_delay(&self, retry_count: i32) -> Duration {
        let max = self.max_delay.as_secs_f64();
        let exponent = retry_count.clamp(0, 64);
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !raw.is_finite() || raw >= max {
            return self.max_delay;
        }
        Duration::from_secs_f64(raw.max(0.0))
    }

    /// Delay before the next attempt, with jitter applied.
    pub fn delay_for(&self, retry_count: i32) -> Duration {
        let nominal = self.nominal_delay(retry_count);
        if self.jitter_ratio <= 0.0 || nominal.is_zero() {
            return nominal;
        }
        let spread = nominal.as_secs_f64() * self.jitter_ratio;
        let offset = rand::rng().random_range(-spread..=spread);
        let jittered = (nominal.as_secs_f64() + offset).clamp(0.0, self.max_delay.as_secs_f64());
        Duration::from_secs_f64(jittered)
    }

    /// [`Self::delay_for`] as a chrono duration, for timestamp arithmetic.
    pub fn next_delay(&self, retry_count: i32) -> chrono::Duration {
        chrono::Duration::from_std(self.delay_for(retry_count))
            .unwrap_or_else(|_| chrono::Duration::seconds(self.max_delay.as_secs() as i64))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
