//! Prewrite retry policy
//!
//! Only the sequence up to and including the setup frame is retried. Once
//! a data chunk has been sent, any failure is final.

use super::timing::TimingProfile;
use crate::error::UploadError;

/// Default number of extra attempts before data transfer
pub const PREWRITE_RETRIES: u8 = 2;

/// Default pause between attempts
pub const RETRY_BACKOFF_MS: u32 = 500;

/// Bounded-attempt policy with fixed backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u8,
    /// Pause between attempts
    pub backoff_ms: u32,
    /// Use conservative timings after the first attempt
    pub escalate: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: PREWRITE_RETRIES,
            backoff_ms: RETRY_BACKOFF_MS,
            escalate: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt
    pub const fn no_retry() -> Self {
        Self {
            retries: 0,
            backoff_ms: 0,
            escalate: false,
        }
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u8 {
        self.retries.saturating_add(1)
    }

    /// Timings for a 1-based attempt number
    pub fn profile_for(&self, attempt: u8) -> TimingProfile {
        if attempt > 1 && self.escalate {
            TimingProfile::CONSERVATIVE
        } else {
            TimingProfile::NORMAL
        }
    }

    /// Whether `error` from `attempt` earns another attempt
    pub fn should_retry<E>(&self, attempt: u8, error: &UploadError<E>) -> bool {
        error.is_retryable() && attempt < self.max_attempts()
    }
}
