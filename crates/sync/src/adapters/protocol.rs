//! The resilient fetch protocol's retry state machine.
//!
//! Each fetch invocation walks `ATTEMPT -> {SUCCESS, AUTH_EXPIRED,
//! TRANSIENT_FAILURE} -> (RETRY | EXHAUSTED)`. The transition decision and
//! the backoff schedule are pure functions on [`RetryPolicy`], so they are
//! unit-testable without network timing; real sleeping is injected through
//! the [`Sleeper`] trait.

use std::time::Duration;

use async_trait::async_trait;

use super::types::ExternalProduct;

/// Bounds on the retry schedule of one fetch invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts before the protocol reports exhaustion.
    pub max_attempts: u32,
    /// Backoff for the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Ceiling on any single backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Outcome of a single attempt against the platform endpoint.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 2xx response; catalog parsed and normalized.
    Success(Vec<ExternalProduct>),
    /// 401 response; a token refresh should be tried before the next attempt.
    AuthExpired {
        /// Response body, kept for the log trail.
        body: String,
    },
    /// Non-401 failure status or a request-level error.
    Transient {
        /// Description of the failure, kept for the log trail.
        error: String,
    },
}

impl AttemptOutcome {
    /// Short state label used in log metadata.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::AuthExpired { .. } => "auth_expired",
            Self::Transient { .. } => "transient_failure",
        }
    }
}

/// Decision taken after a failed attempt. A successful attempt is terminal
/// on its own and never consults the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Sleep for the given delay, then re-enter `ATTEMPT`.
    RetryAfter(Duration),
    /// Attempt budget spent; surface a hard failure.
    Exhausted,
}

impl RetryPolicy {
    /// Backoff delay scheduled after the given attempt (1-based):
    /// `min(max_delay, base_delay * 2^attempt)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // 2^attempt saturates well before the shift overflows.
        let factor = 1u32.checked_shl(attempt.min(20)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Decide the transition out of a failed attempt (1-based). Auth-expired
    /// and transient failures follow the same schedule.
    #[must_use]
    pub fn decide(&self, attempt: u32) -> Transition {
        if attempt >= self.max_attempts {
            Transition::Exhausted
        } else {
            Transition::RetryAfter(self.delay_for(attempt))
        }
    }
}

/// Injected backoff sleep, so tests can skip real waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the calling task for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> AttemptOutcome {
        AttemptOutcome::Transient {
            error: "connection reset".to_string(),
        }
    }

    #[test]
    fn test_backoff_growth_non_decreasing_and_capped() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=15 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
        // 2^1 * 100ms and the ceiling.
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(12), Duration::from_secs(30));
    }

    #[test]
    fn test_decide_exhausts_at_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(matches!(policy.decide(1), Transition::RetryAfter(_)));
        assert!(matches!(policy.decide(2), Transition::RetryAfter(_)));
        assert_eq!(policy.decide(3), Transition::Exhausted);
    }

    #[test]
    fn test_decide_follows_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(2), Transition::RetryAfter(policy.delay_for(2)));
    }

    #[test]
    fn test_outcome_state_labels() {
        assert_eq!(AttemptOutcome::Success(Vec::new()).state(), "success");
        assert_eq!(
            AttemptOutcome::AuthExpired {
                body: String::new()
            }
            .state(),
            "auth_expired"
        );
        assert_eq!(transient().state(), "transient_failure");
    }
}
