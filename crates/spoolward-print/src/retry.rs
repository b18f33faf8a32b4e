// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy for failed processing attempts.
//
// The delay between attempts is flat, so the worst-case retry time of a job
// is bounded by `max_attempts × delay` whatever the failure was.

use std::time::Duration;

use tracing::{debug, info, warn};

use spoolward_core::SpoolConfig;
use spoolward_core::error::SpoolError;

/// How many times a job is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total processing attempts before a job is failed.
    pub max_attempts: u32,
    /// Wait after a failed attempt before the job competes for the worker again.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Requeue the job and let the worker idle for this long.
    RetryAfter(Duration),
    /// The error is not one a retry can fix.
    GiveUp,
    /// The job has used all its attempts.
    Exhausted,
}

impl RetryPolicy {
    pub fn from_config(config: &SpoolConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts.max(1),
            delay: config.retry_delay(),
        }
    }

    /// Decide what happens after attempt number `attempts` failed with `err`.
    pub fn decide(&self, err: &SpoolError, attempts: u32) -> RetryDecision {
        if !err.is_retryable() {
            info!(error = %err, "non-retryable error, not retrying");
            return RetryDecision::GiveUp;
        }
        if attempts >= self.max_attempts {
            warn!(attempts, max = self.max_attempts, "retry limit exhausted");
            return RetryDecision::Exhausted;
        }
        debug!(attempts, delay_ms = self.delay.as_millis() as u64, "scheduling retry");
        RetryDecision::RetryAfter(self.delay)
    }
}
