use std::time::Duration;

use crate::handle::HiveError;

/// How many messages a worker processes from one actor before handing it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceLimit {
    /// Process at most this many messages per slice.
    Bounded(usize),
    /// Drain the mailbox until it is empty.
    Unbounded,
}

impl SliceLimit {
    pub(crate) fn allows(&self, processed: usize) -> bool {
        match self {
            SliceLimit::Bounded(max) => processed < *max,
            SliceLimit::Unbounded => true,
        }
    }
}

impl Default for SliceLimit {
    fn default() -> Self {
        SliceLimit::Bounded(5)
    }
}

/// Configuration for a [`Hive`](crate::Hive).
///
/// ```
/// # use hive_actors::{HiveConfig, SliceLimit};
/// # use std::time::Duration;
/// let config = HiveConfig::default()
///     .with_num_workers(2)
///     .with_max_messages_per_slice(SliceLimit::Unbounded)
///     .with_worker_poll_timeout(Duration::from_millis(100));
/// assert_eq!(config.num_workers, 2);
/// ```
#[derive(Debug, Clone)]
pub struct HiveConfig {
    /// Number of workers processing actors.
    pub num_workers: usize,
    /// Number of messages a worker processes from one actor before moving on.
    pub max_messages_per_slice: SliceLimit,
    /// How long a worker waits on the run queue before checking whether it should stop.
    pub worker_poll_timeout: Duration,
    /// How long the hive waits on its action queue before checking whether it should stop.
    pub dispatch_poll_timeout: Duration,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            num_workers: 5,
            max_messages_per_slice: SliceLimit::default(),
            worker_poll_timeout: Duration::from_secs(1),
            dispatch_poll_timeout: Duration::from_secs(1),
        }
    }
}

impl HiveConfig {
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_max_messages_per_slice(mut self, limit: SliceLimit) -> Self {
        self.max_messages_per_slice = limit;
        self
    }

    pub fn with_worker_poll_timeout(mut self, timeout: Duration) -> Self {
        self.worker_poll_timeout = timeout;
        self
    }

    pub fn with_dispatch_poll_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_poll_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), HiveError> {
        if self.num_workers == 0 {
            return Err(HiveError::InvalidConfig("num_workers must be at least one"));
        }

        if self.max_messages_per_slice == SliceLimit::Bounded(0) {
            return Err(HiveError::InvalidConfig(
                "max_messages_per_slice must be at least one",
            ));
        }

        if self.worker_poll_timeout.is_zero() || self.dispatch_poll_timeout.is_zero() {
            return Err(HiveError::InvalidConfig("poll timeouts must be non-zero"));
        }

        Ok(())
    }
}
