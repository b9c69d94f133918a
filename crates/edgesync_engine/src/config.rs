//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for one node's synchronization.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Node name used in logs.
    pub node_name: String,
    /// Maximum number of pending events read per outbound batch.
    pub max_read_records: usize,
    /// How long the outbound pump sleeps when nothing is pending.
    pub no_records_sleep: Duration,
    /// Pause between two non-empty outbound batches.
    pub sleep_between_batches: Duration,
    /// Retry configuration for sends.
    pub retry: RetryConfig,
    /// Whether repeated follow-up requests for one entity are merged while
    /// the first is still pending.
    pub coalesce_follow_ups: bool,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            max_read_records: 50,
            no_records_sleep: Duration::from_secs(1),
            sleep_between_batches: Duration::ZERO,
            retry: RetryConfig::default(),
            coalesce_follow_ups: true,
        }
    }

    /// Sets the outbound batch size (at least 1).
    pub fn with_max_read_records(mut self, records: usize) -> Self {
        self.max_read_records = records.max(1);
        self
    }

    /// Sets the idle sleep.
    pub fn with_no_records_sleep(mut self, sleep: Duration) -> Self {
        self.no_records_sleep = sleep;
        self
    }

    /// Sets the pause between batches.
    pub fn with_sleep_between_batches(mut self, sleep: Duration) -> Self {
        self.sleep_between_batches = sleep;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enables or disables follow-up coalescing.
    pub fn with_coalesce_follow_ups(mut self, coalesce: bool) -> Self {
        self.coalesce_follow_ups = coalesce;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("edge")
    }
}

/// Backoff for outbound sends.
///
/// The delay before retry `n` is `initial_delay * 2^(n-1)`, capped at
/// `max_delay`, plus up to a quarter more when jitter is on.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per envelope, the first send included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the doubled delay.
    pub max_delay: Duration,
    /// Whether to spread delays.
    pub jitter: bool,
}

/// Retries past this many keep the same base delay.
const MAX_DOUBLINGS: u32 = 16;

impl RetryConfig {
    /// Creates a retry configuration (at least one attempt).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns the delay before `attempt` (0 is the first send).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let doublings = (attempt - 1).min(MAX_DOUBLINGS);
        let delay = self
            .initial_delay
            .saturating_mul(1 << doublings)
            .min(self.max_delay);
        if self.jitter {
            delay + delay.mul_f64(0.25 * clock_fraction())
        } else {
            delay
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Fraction in `[0, 1)` from the sub-second clock.
fn clock_fraction() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1024) / 1024.0
}
