//! Bounded retry with exponential backoff and jitter.
//!
//! [`RetryExecutor`] wraps any fallible async operation. Between failed
//! attempts it sleeps for
//!
//! ```text
//! delay  = min(max_delay, initial_delay * multiplier^(attempt - 1))
//! sleep  = delay + uniform(0, delay * jitter_factor)
//! ```
//!
//! The sleep observes the [`SearchContext`] and aborts as soon as the
//! context is canceled or its deadline passes. No sleep follows the final
//! attempt, and an error the permanence predicate accepts ends the loop at
//! once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::{ContextError, SearchContext};
use crate::error::SearchError;

/// Default number of attempts (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 100;

/// Default upper bound on a single backoff delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 1000;

/// Default backoff multiplier.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default jitter as a fraction of the computed delay.
pub const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Retry policy for provider calls.
///
/// # Examples
///
/// ```
/// use skyscan_search::retry::RetryPolicy;
///
/// let policy = RetryPolicy::default().with_max_attempts(5);
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.initial_delay_ms, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds.
    pub initial_delay_ms: u64,
    /// Cap on the exponential delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Random extra delay, as a fraction of the computed delay (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the initial delay in milliseconds.
    pub fn with_initial_delay_ms(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = initial_delay_ms;
        self
    }

    /// Set the maximum delay in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the jitter factor.
    pub fn with_jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Validates this policy.
    ///
    /// Checks:
    /// - `max_attempts` must be greater than 0
    /// - `initial_delay_ms` must be <= `max_delay_ms`
    /// - `multiplier` must be finite and >= 1.0
    /// - `jitter_factor` must be within `[0.0, 1.0]`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_attempts == 0 {
            return Err(SearchError::Config(
                "retry max_attempts must be greater than 0".into(),
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(SearchError::Config(
                "retry initial_delay_ms must be <= max_delay_ms".into(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(SearchError::Config(
                "retry multiplier must be >= 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(SearchError::Config(
                "retry jitter_factor must be within [0.0, 1.0]".into(),
            ));
        }
        Ok(())
    }

    /// Backoff delay after failed attempt `attempt` (1-based), before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let grown = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = grown.min(self.max_delay_ms as f64);
        millis_to_duration(capped)
    }

    /// Backoff delay after failed attempt `attempt` (1-based), with jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let base_ms = base.as_secs_f64() * 1000.0;
        let jitter_ms = base_ms * self.jitter_factor * rand::random::<f64>();
        base + millis_to_duration(jitter_ms)
    }
}

fn millis_to_duration(ms: f64) -> Duration {
    if !ms.is_finite() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((ms * 1000.0) as u64)
}

/// Why a retried operation ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    /// The context stopped before or between attempts.
    #[error("retry interrupted: {0}")]
    Interrupted(ContextError),
    /// The last error returned by the operation.
    #[error("{0}")]
    Operation(E),
}

type PermanencePredicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Runs an operation under a [`RetryPolicy`].
pub struct RetryExecutor<E> {
    policy: RetryPolicy,
    is_permanent: Option<PermanencePredicate<E>>,
}

impl<E> fmt::Debug for RetryExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("has_permanence_predicate", &self.is_permanent.is_some())
            .finish()
    }
}

impl<E: fmt::Display> RetryExecutor<E> {
    /// Create an executor that retries every error.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            is_permanent: None,
        }
    }

    /// Stop retrying as soon as `predicate` returns `true` for an error.
    pub fn with_permanent<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.is_permanent = Some(Box::new(predicate));
        self
    }

    /// The policy this executor runs with.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `operation` until it succeeds, fails permanently, runs out of
    /// attempts, or `ctx` is done.
    ///
    /// # Errors
    ///
    /// - [`RetryError::Interrupted`] if `ctx` was canceled or hit its
    ///   deadline before an attempt, during one, or during a backoff sleep.
    /// - [`RetryError::Operation`] with the last observed error otherwise.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &SearchContext,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1u32;

        loop {
            if let Some(err) = ctx.err() {
                return Err(RetryError::Interrupted(err));
            }

            // An in-flight attempt is dropped as soon as the context is done.
            let error = match ctx.run(operation()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(error)) => error,
                Err(err) => return Err(RetryError::Interrupted(err)),
            };

            if self.is_permanent.as_ref().is_some_and(|p| p(&error)) {
                tracing::debug!(attempt, error = %error, "permanent failure, not retrying");
                return Err(RetryError::Operation(error));
            }
            if attempt >= max_attempts {
                tracing::debug!(attempt, error = %error, "retry budget exhausted");
                return Err(RetryError::Operation(error));
            }

            let delay = self.policy.delay_for_attempt(attempt);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "attempt failed, backing off"
            );
            ctx.run(tokio::time::sleep(delay))
                .await
                .map_err(RetryError::Interrupted)?;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn no_jitter(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_initial_delay_ms(100)
            .with_max_delay_ms(1000)
            .with_multiplier(2.0)
            .with_jitter_factor(0.0)
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay_ms, 100);
        assert_eq!(policy.max_delay_ms, 1000);
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
        assert!((policy.jitter_factor - 0.1).abs() < f64::EPSILON);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn base_delay_grows_then_caps() {
        let policy = no_jitter(10);
        assert_eq!(policy.base_delay(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay(3), Duration::from_millis(400));
        assert_eq!(policy.base_delay(4), Duration::from_millis(800));
        assert_eq!(policy.base_delay(5), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(60), Duration::from_millis(1000));
    }

    #[test]
    fn jitter_stays_within_factor() {
        let policy = no_jitter(3).with_jitter_factor(0.5);
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(2);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn invalid_policies_rejected() {
        assert!(no_jitter(0).validate().is_err());
        assert!(no_jitter(3)
            .with_initial_delay_ms(2000)
            .validate()
            .unwrap_err()
            .to_string()
            .contains("initial_delay_ms"));
        assert!(no_jitter(3).with_multiplier(0.5).validate().is_err());
        assert!(no_jitter(3).with_jitter_factor(1.5).validate().is_err());
        assert!(no_jitter(3).with_jitter_factor(-0.1).validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_runs_exactly_max_attempts_without_trailing_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::<ProviderError>::new(no_jitter(3));
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let result: Result<(), _> = executor
            .execute(&SearchContext::new(), || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Transient("upstream 503".into()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            result.unwrap_err(),
            RetryError::Operation(ProviderError::Transient("upstream 503".into()))
        );
        // 100ms after attempt 1, 200ms after attempt 2, nothing after attempt 3.
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_halts_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(no_jitter(5)).with_permanent(ProviderError::is_permanent);
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let result: Result<(), _> = executor
            .execute(&SearchContext::new(), || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Permanent("fixture missing".into()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(RetryError::Operation(ProviderError::Permanent(_)))
        ));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(no_jitter(3)).with_permanent(ProviderError::is_permanent);

        let counter = Arc::clone(&calls);
        let result = executor
            .execute(&SearchContext::new(), || {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(ProviderError::Transient(format!("blip {n}")))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_backoff_sleep() {
        let ctx = SearchContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::<ProviderError>::new(
            no_jitter(3)
                .with_initial_delay_ms(10_000)
                .with_max_delay_ms(10_000),
        );
        let start = Instant::now();

        let counter = Arc::clone(&calls);
        let result: Result<(), _> = executor
            .execute(&ctx, || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Transient("slow upstream".into()))
                }
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            RetryError::Interrupted(ContextError::Canceled)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drops_in_flight_attempt() {
        let ctx = SearchContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let executor = RetryExecutor::<ProviderError>::new(no_jitter(3));
        let start = Instant::now();

        // The operation never looks at `ctx`.
        let result: Result<(), _> = executor
            .execute(&ctx, || async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            RetryError::Interrupted(ContextError::Canceled)
        );
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_backoff_sleep() {
        let ctx = SearchContext::new().with_timeout(Duration::from_millis(150));
        let executor = RetryExecutor::<ProviderError>::new(no_jitter(5));
        let start = Instant::now();

        let result: Result<(), _> = executor
            .execute(&ctx, || async {
                Err(ProviderError::Transient("still down".into()))
            })
            .await;

        // Attempt 1 at 0ms, sleep 100ms, attempt 2 at 100ms, sleep cut at 150ms.
        assert_eq!(
            result.unwrap_err(),
            RetryError::Interrupted(ContextError::DeadlineExceeded)
        );
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test]
    async fn canceled_context_skips_first_attempt() {
        let ctx = SearchContext::new();
        ctx.cancel();
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::<ProviderError>::new(no_jitter(3));

        let result: Result<(), _> = executor
            .execute(&ctx, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Interrupted(ContextError::Canceled))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn retry_error_display() {
        let interrupted: RetryError<ProviderError> = RetryError::Interrupted(ContextError::Canceled);
        assert_eq!(interrupted.to_string(), "retry interrupted: canceled");
        let op = RetryError::Operation(ProviderError::Transient("x".into()));
        assert_eq!(op.to_string(), "transient provider error: x");
    }
}
