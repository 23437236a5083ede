//! # Global runtime configuration.
//!
//! [`Config`] defines the dispatch runtime's behavior: queue capacity,
//! retry budget, retry placement, and the publishing strategy.
//!
//! # Example
//! ```
//! use mediary::{Config, PublishStrategy, RetryAction};
//!
//! let mut cfg = Config::default();
//! cfg.queue_capacity = 128;
//! cfg.max_retries = 5;
//! cfg.retry_action = RetryAction::ImmediateRetry;
//! cfg.strategy = PublishStrategy::AwaitInParallel;
//!
//! assert_eq!(cfg.max_retries, 5);
//! ```

use crate::publisher::PublishStrategy;

/// Where a retried event goes relative to the rest of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryAction {
    /// Re-enqueue at the tail; other queued events run first.
    #[default]
    MoveLast,
    /// Retry in place before touching the rest of the queue.
    ImmediateRetry,
}

/// Global configuration for the dispatch runtime.
///
/// Controls the event queue, the listener's retry loop, and how the
/// publisher fans out to multiple handlers.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event queue channel (0 is treated as 1).
    pub queue_capacity: usize,
    /// Total delivery attempts per event before it is dead-lettered
    /// (0 is treated as 1).
    pub max_retries: u32,
    /// Placement of retried events.
    pub retry_action: RetryAction,
    /// How the publisher runs multiple handlers for one event.
    pub strategy: PublishStrategy,
}

impl Config {
    /// Queue capacity with the lower bound applied.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Retry budget with the lower bound applied.
    pub fn max_retries(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `queue_capacity = 50`
    /// - `max_retries = 3`
    /// - `retry_action = RetryAction::MoveLast`
    /// - `strategy = PublishStrategy::AwaitForEach`
    fn default() -> Self {
        Self {
            queue_capacity: 50,
            max_retries: 3,
            retry_action: RetryAction::default(),
            strategy: PublishStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let cfg = Config::default();
        assert_eq!(cfg.queue_capacity, 50);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_action, RetryAction::MoveLast);
        assert_eq!(cfg.strategy, PublishStrategy::AwaitForEach);
    }

    #[test]
    fn zero_values_clamp_to_one() {
        let cfg = Config {
            queue_capacity: 0,
            max_retries: 0,
            ..Config::default()
        };
        assert_eq!(cfg.queue_capacity(), 1);
        assert_eq!(cfg.max_retries(), 1);
    }
}
