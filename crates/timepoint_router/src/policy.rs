//! Classification-to-action tables and backoff.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use timepoint_error::{ErrorClass, RouterError, RouterErrorKind};
use tokio_retry2::strategy::ExponentialBackoff;

/// What the router does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryAction {
    /// Retry the same tier within its budget, then advance
    RetryThenFallback,
    /// Advance to the next tier without retrying
    Fallback,
    /// Skip every remaining tier that requires authentication
    FallbackToUnauthenticated,
    /// Stop and surface the failure
    Abort,
}

/// Maps every [`ErrorClass`] to a [`RetryAction`].
///
/// # Examples
///
/// ```
/// use timepoint_error::ErrorClass;
/// use timepoint_router::{ActionTable, RetryAction};
///
/// let table = ActionTable::default();
/// assert_eq!(table.action_for(ErrorClass::QuotaExhausted), RetryAction::Fallback);
/// assert_eq!(table.action_for(ErrorClass::Timeout), RetryAction::RetryThenFallback);
///
/// let strict = table.with_action(ErrorClass::AuthFailed, RetryAction::Abort);
/// assert_eq!(strict.action_for(ErrorClass::AuthFailed), RetryAction::Abort);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    actions: HashMap<ErrorClass, RetryAction>,
}

impl Default for ActionTable {
    fn default() -> Self {
        let actions = HashMap::from([
            (ErrorClass::RateLimited, RetryAction::RetryThenFallback),
            (ErrorClass::Transient, RetryAction::RetryThenFallback),
            (ErrorClass::Timeout, RetryAction::RetryThenFallback),
            (ErrorClass::QuotaExhausted, RetryAction::Fallback),
            (ErrorClass::AuthFailed, RetryAction::FallbackToUnauthenticated),
            (ErrorClass::Validation, RetryAction::Abort),
            (ErrorClass::Fatal, RetryAction::Abort),
        ]);
        Self { actions }
    }
}

impl ActionTable {
    /// Action for `class`; unmapped classes abort.
    pub fn action_for(&self, class: ErrorClass) -> RetryAction {
        self.actions
            .get(&class)
            .copied()
            .unwrap_or(RetryAction::Abort)
    }

    /// Override the action for one class.
    pub fn with_action(mut self, class: ErrorClass, action: RetryAction) -> Self {
        self.actions.insert(class, action);
        self
    }
}

/// Exponential backoff between retries of one tier.
///
/// Retry `n` (1-based) waits `2^n x base`, capped at `max_delay`. Jitter adds
/// up to a quarter of that delay but never reaches the cap, so successive
/// delays strictly increase until the cap itself is returned.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use timepoint_router::BackoffPolicy;
///
/// let backoff = BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(10), false);
/// assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
/// assert_eq!(backoff.delay_for(2), Duration::from_millis(400));
/// assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl BackoffPolicy {
    /// Create a backoff policy.
    pub fn new(base: Duration, max_delay: Duration, jitter: bool) -> Self {
        Self {
            base,
            max_delay,
            jitter,
        }
    }

    /// Delay slept before retry `retry` (1-based). Retry 0 never waits.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let base_ms = (self.base.as_millis() as u64).max(1);
        let delay = ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(self.max_delay)
            .nth((retry - 1) as usize)
            .unwrap_or(self.max_delay);

        if self.jitter && delay < self.max_delay {
            let ceiling = self.max_delay.saturating_sub(Duration::from_millis(1));
            (delay + bounded_jitter(delay)).min(ceiling).max(delay)
        } else {
            delay
        }
    }

    /// Delays for retries `1..=retries`.
    pub fn schedule(&self, retries: u32) -> Vec<Duration> {
        (1..=retries).map(|retry| self.delay_for(retry)).collect()
    }
}

fn bounded_jitter(delay: Duration) -> Duration {
    let quarter = delay.as_millis() as u64 / 4;
    if quarter == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=quarter))
}

/// Everything the router needs to decide what to do after an attempt.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct RoutingPolicy {
    /// Classification-to-action table
    actions: ActionTable,
    /// Delay schedule between retries
    backoff: BackoffPolicy,
    /// Deadline for a single provider attempt
    attempt_timeout: Duration,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            actions: ActionTable::default(),
            backoff: BackoffPolicy::default(),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RoutingPolicy {
    /// Create a policy, rejecting a zero attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `attempt_timeout` is zero.
    #[track_caller]
    pub fn new(
        actions: ActionTable,
        backoff: BackoffPolicy,
        attempt_timeout: Duration,
    ) -> Result<Self, RouterError> {
        if attempt_timeout.is_zero() {
            return Err(RouterError::new(RouterErrorKind::InvalidPolicy(
                "attempt timeout must be greater than zero".to_string(),
            )));
        }
        Ok(Self {
            actions,
            backoff,
            attempt_timeout,
        })
    }

    /// Replace the action table.
    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Replace the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the per-attempt timeout. Zero is ignored.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        if !attempt_timeout.is_zero() {
            self.attempt_timeout = attempt_timeout;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_never_reaches_next_delay() {
        let backoff = BackoffPolicy::new(Duration::from_millis(10), Duration::from_secs(60), true);
        for _ in 0..200 {
            let schedule = backoff.schedule(5);
            assert!(schedule.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", schedule);
        }
    }

    #[test]
    fn delays_cap_at_max() {
        let backoff = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(3), true);
        assert_eq!(backoff.delay_for(4), Duration::from_secs(3));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = RoutingPolicy::new(
            ActionTable::default(),
            BackoffPolicy::default(),
            Duration::ZERO,
        );
        assert!(result.is_err());
    }
}
