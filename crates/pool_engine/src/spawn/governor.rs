//! Population ceiling for spawners
//!
//! The governor compares the active count against a ceiling on a fixed poll
//! interval and broadcasts the resulting "spawnable" flag on every poll.
//! Spawners hold a [`Subscription`] and skip attempts while the last value
//! they saw is `false`.

use crate::core::config::GovernorConfig;
use crate::events::{Broadcaster, Subscription};
use crate::pool::ConfigurationError;

/// Shared spawn gate driven by the active population
pub struct SpawnGovernor {
    config: GovernorConfig,
    spawnable: bool,
    since_poll: f32,
    ticks: u64,
    channel: Broadcaster<bool>,
}

impl SpawnGovernor {
    /// Create a governor; spawning starts enabled
    pub fn new(config: GovernorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        log::info!(
            "Spawn governor: ceiling {}, polled every {:.2}s",
            config.ceiling,
            config.poll_interval
        );
        Ok(Self {
            config,
            spawnable: true,
            since_poll: 0.0,
            ticks: 0,
            channel: Broadcaster::new(),
        })
    }

    /// Receive the spawnable flag on every poll; dropping it unsubscribes
    pub fn subscribe(&mut self) -> Subscription<bool> {
        self.channel.subscribe()
    }

    /// Recompute the flag as `active_count <= ceiling` and broadcast it
    pub fn tick(&mut self, active_count: usize, ceiling: usize) -> bool {
        let spawnable = active_count <= ceiling;
        if spawnable != self.spawnable {
            log::debug!(
                "Spawning {} ({} active, ceiling {})",
                if spawnable { "resumed" } else { "halted" },
                active_count,
                ceiling
            );
        }
        self.spawnable = spawnable;
        self.ticks += 1;
        self.channel.publish(spawnable);
        spawnable
    }

    /// Advance the poll clock; polls against the configured ceiling when due.
    /// Negative or non-finite deltas count as zero.
    pub fn update(&mut self, dt: f32, active_count: usize) -> Option<bool> {
        self.since_poll += if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if self.since_poll < self.config.poll_interval {
            return None;
        }
        self.since_poll %= self.config.poll_interval;
        Some(self.tick(active_count, self.config.ceiling))
    }

    /// Session end: re-enable spawning and restart the poll clock
    pub fn reset(&mut self) {
        self.spawnable = true;
        self.since_poll = 0.0;
        self.ticks = 0;
        self.channel.publish(true);
        log::debug!("Spawn governor reset");
    }

    /// Last computed flag
    pub fn is_spawnable(&self) -> bool {
        self.spawnable
    }

    /// Configured ceiling
    pub fn ceiling(&self) -> usize {
        self.config.ceiling
    }

    /// Change the ceiling used by future polls
    pub fn set_ceiling(&mut self, ceiling: usize) {
        self.config.ceiling = ceiling;
    }

    /// Number of polls since creation or reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(ceiling: usize) -> SpawnGovernor {
        SpawnGovernor::new(GovernorConfig::new(ceiling, 1.0)).unwrap()
    }

    #[test]
    fn test_tick_compares_against_ceiling() {
        let mut governor = governor(10);
        assert!(!governor.tick(11, 10));
        assert!(governor.tick(10, 10));
        assert!(governor.tick(9, 10));
    }

    #[test]
    fn test_every_tick_is_broadcast() {
        let mut governor = governor(10);
        let gate = governor.subscribe();
        governor.tick(3, 10);
        governor.tick(4, 10);
        governor.tick(12, 10);
        assert_eq!(gate.drain(), vec![true, true, false]);
    }

    #[test]
    fn test_update_polls_on_interval() {
        let mut governor = governor(2);
        assert_eq!(governor.update(0.4, 5), None);
        assert_eq!(governor.update(0.4, 5), None);
        assert_eq!(governor.update(0.4, 5), Some(false));
        assert_eq!(governor.ticks(), 1);
        assert!(!governor.is_spawnable());
    }

    #[test]
    fn test_non_finite_delta_does_not_poll() {
        let mut governor = governor(2);
        assert_eq!(governor.update(f32::INFINITY, 5), None);
        assert_eq!(governor.update(f32::NAN, 5), None);
        assert_eq!(governor.update(0.5, 5), None);
        assert_eq!(governor.update(0.5, 5), Some(false));
        assert_eq!(governor.ticks(), 1);
    }

    #[test]
    fn test_reset_reenables_spawning() {
        let mut governor = governor(0);
        let gate = governor.subscribe();
        governor.tick(1, 0);
        governor.reset();
        assert!(governor.is_spawnable());
        assert_eq!(gate.latest(), Some(true));
    }

    #[test]
    fn test_rejects_bad_interval() {
        assert!(SpawnGovernor::new(GovernorConfig::new(5, -1.0)).is_err());
    }
}
