//! Retry bookkeeping for failed connection attempts

use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule retry number `retry` of `max` after `delay`
    Retry { retry: u32, max: u32, delay: Duration },
    /// Retries used up; wait for the user
    Exhausted { max: u32 },
}

/// Fixed-delay retry counter.
///
/// The count stays within `0..=max_retries` and is reset whenever the config
/// screen is shown again.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    count: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            count: 0,
        }
    }

    /// Record a failure and decide whether another attempt is scheduled
    pub fn on_failure(&mut self) -> RetryDecision {
        if self.count < self.max_retries {
            self.count += 1;
            RetryDecision::Retry {
                retry: self.count,
                max: self.max_retries,
                delay: self.delay,
            }
        } else {
            RetryDecision::Exhausted {
                max: self.max_retries,
            }
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
