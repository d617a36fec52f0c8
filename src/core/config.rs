//! # Notifier configuration.
//!
//! Provides [`Config`] centralized settings for one notifier instance.
//!
//! ## Sentinel values
//! - `limit = 0` → unbounded registry
//! - `sweep_interval = 0s` → no background sweeper (`purge` is driven externally)

use std::time::Duration;

/// Configuration for a [`Notifier`](crate::Notifier).
///
/// ## Field semantics
/// - `name`: label attached to every event this notifier publishes
/// - `limit`: maximum number of live subscriptions (`0` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `sweep_interval`: period of the background purge (`0s` = disabled)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Label attached to events as `source`.
    pub name: String,

    /// Maximum number of live subscriptions.
    ///
    /// - `0` = unbounded
    /// - `n > 0` = subscribing a new key while `n` entries are live calls the
    ///   handler with the stopped arguments instead of inserting
    ///
    /// Renewing an existing key is never limited.
    pub limit: usize,

    /// Capacity of the event bus created by the builder.
    ///
    /// Ignored when the builder is given an existing bus.
    pub bus_capacity: usize,

    /// Period of the background sweeper started by
    /// [`Notifier::spawn_sweeper`](crate::Notifier::spawn_sweeper).
    ///
    /// - `Duration::ZERO` = no sweeper
    pub sweep_interval: Duration,
}

impl Config {
    /// Returns the registry limit as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` live subscriptions
    #[inline]
    pub fn capacity_limit(&self) -> Option<usize> {
        if self.limit == 0 {
            None
        } else {
            Some(self.limit)
        }
    }

    /// Returns the sweeper period as an `Option`.
    #[inline]
    pub fn sweep_period(&self) -> Option<Duration> {
        if self.sweep_interval == Duration::ZERO {
            None
        } else {
            Some(self.sweep_interval)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "notifier"`
    /// - `limit = 0` (unbounded)
    /// - `bus_capacity = 1024`
    /// - `sweep_interval = 0s` (no sweeper)
    fn default() -> Self {
        Self {
            name: "notifier".to_string(),
            limit: 0,
            bus_capacity: 1024,
            sweep_interval: Duration::ZERO,
        }
    }
}
