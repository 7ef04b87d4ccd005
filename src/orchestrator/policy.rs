//! Bounded wait policy for pull request merges.
//!
//! Merge readiness is owned by the hosting provider, which offers no push
//! notification, so the release run polls at a fixed interval until a
//! deadline. The policy is plain data so tests can shrink it or drive it
//! with tokio's paused clock.

use crate::error::{ReleaseError, Result};
use tokio::time::{Duration, Instant};

/// Default delay between merge-state queries and merge attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Default wall-clock budget for the whole merge wait
pub const DEFAULT_MERGE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

const MAX_POLL_INTERVAL_SECS: u64 = 60 * 60;
const MAX_MERGE_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Interval and deadline for waiting on a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Delay between attempts
    pub poll_interval: Duration,
    /// Total time allowed before giving up with `Timeout`
    pub timeout: Duration,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_MERGE_TIMEOUT,
        }
    }
}

impl MergePolicy {
    /// Parse seconds from an environment variable, clamped to `max`.
    /// Zero, unparsable and unset values fall back to `default`.
    fn parse_secs_env(var_name: &str, default: Duration, max: u64) -> Duration {
        std::env::var(var_name)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.min(max)))
            .unwrap_or(default)
    }

    /// Policy from `RELEASE_TOOL_POLL_INTERVAL_SECS` and
    /// `RELEASE_TOOL_MERGE_TIMEOUT_SECS`, falling back to the defaults
    pub fn from_env() -> Self {
        Self {
            poll_interval: Self::parse_secs_env(
                "RELEASE_TOOL_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL,
                MAX_POLL_INTERVAL_SECS,
            ),
            timeout: Self::parse_secs_env(
                "RELEASE_TOOL_MERGE_TIMEOUT_SECS",
                DEFAULT_MERGE_TIMEOUT,
                MAX_MERGE_TIMEOUT_SECS,
            ),
        }
    }

    /// Start the clock
    pub fn start(&self) -> Deadline {
        Deadline {
            started: Instant::now(),
            timeout: self.timeout,
        }
    }
}

/// A running merge wait
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    /// Time spent since the wait started
    pub fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.started)
    }

    /// Fail with `Timeout` once the budget is used up
    pub fn check(&self, waiting_for: &str) -> Result<()> {
        let elapsed = self.elapsed();
        if elapsed >= self.timeout {
            return Err(ReleaseError::Timeout {
                waiting_for: waiting_for.to_string(),
                elapsed,
            });
        }
        Ok(())
    }
}
