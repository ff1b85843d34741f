//! Polling of target-side busy conditions.
//!
//! Chip erase, flash writes and the oscillator switch finish after a delay
//! only the target knows about. [`Poller`] repeats a check with an
//! exponential backoff until it succeeds. Without a timeout it waits forever,
//! because aborting half way would leave the flash in an undefined state.

use std::time::{Duration, Instant};

#[derive(thiserror::Error, Debug, docsplay::Display, Clone, PartialEq, Eq)]
/// Timed out after {elapsed:?} waiting for {operation}.
pub struct PollTimeout {
    /// What was being waited for.
    pub operation: &'static str,
    /// How long the loop ran.
    pub elapsed: Duration,
}

/// Repeats a readiness check with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poller {
    timeout: Option<Duration>,
    initial_interval: Duration,
    max_interval: Duration,
}

impl Poller {
    /// Interval between the first two checks.
    pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_micros(100);
    /// Upper bound for the interval between checks.
    pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(10);

    /// A poller without a timeout.
    pub fn new() -> Self {
        Self {
            timeout: None,
            initial_interval: Self::DEFAULT_INITIAL_INTERVAL,
            max_interval: Self::DEFAULT_MAX_INTERVAL,
        }
    }

    /// Give up after `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the first and the largest interval between two checks.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max.max(initial);
        self
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Call `ready` until it returns `true`.
    ///
    /// Errors returned by `ready` end the loop immediately. If a timeout is
    /// configured and expires, a [`PollTimeout`] converted into `E` is
    /// returned.
    pub fn until<E>(
        &self,
        operation: &'static str,
        mut ready: impl FnMut() -> Result<bool, E>,
    ) -> Result<(), E>
    where
        E: From<PollTimeout>,
    {
        let start = Instant::now();
        let mut interval = self.initial_interval;
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            if ready()? {
                tracing::debug!(
                    "{} finished after {} polls ({:?})",
                    operation,
                    attempts,
                    start.elapsed()
                );
                return Ok(());
            }

            let elapsed = start.elapsed();
            if let Some(timeout) = self.timeout {
                if elapsed >= timeout {
                    tracing::warn!("Giving up on {} after {:?}", operation, elapsed);
                    return Err(PollTimeout { operation, elapsed }.into());
                }
            }

            tracing::trace!("{} not done yet (poll {})", operation, attempts);
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
            interval = (interval * 2).min(self.max_interval);
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}
