//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls provider timeouts, ranking weights, and retry
//! behaviour. Every field has a default, so a partial TOML or JSON table
//! deserializes cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::orchestrator::ranking::RankingWeights;
use crate::retry::RetryPolicy;

/// Default bound on a single provider query, retries included.
pub const DEFAULT_PER_PROVIDER_TIMEOUT_MS: u64 = 2_000;

/// Default bound on a whole search.
pub const DEFAULT_GLOBAL_TIMEOUT_MS: u64 = 5_000;

/// Configuration for a flight search.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-provider budget in milliseconds, covering every retry attempt.
    pub per_provider_timeout_ms: u64,
    /// Whole-search budget in milliseconds. Providers still running when it
    /// elapses are abandoned and the search completes with what it has.
    pub global_timeout_ms: u64,
    /// Weights for the best-value score.
    pub ranking: RankingWeights,
    /// Backoff policy for transient provider failures.
    pub retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_provider_timeout_ms: DEFAULT_PER_PROVIDER_TIMEOUT_MS,
            global_timeout_ms: DEFAULT_GLOBAL_TIMEOUT_MS,
            ranking: RankingWeights::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl SearchConfig {
    /// Per-provider budget as a [`Duration`].
    pub fn per_provider_timeout(&self) -> Duration {
        Duration::from_millis(self.per_provider_timeout_ms)
    }

    /// Whole-search budget as a [`Duration`].
    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `per_provider_timeout_ms` must be greater than 0
    /// - `global_timeout_ms` must be greater than 0
    /// - ranking weights are non-negative and sum to 1
    /// - the retry policy is well formed
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.per_provider_timeout_ms == 0 {
            return Err(SearchError::Config(
                "per_provider_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.global_timeout_ms == 0 {
            return Err(SearchError::Config(
                "global_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.per_provider_timeout_ms > self.global_timeout_ms {
            tracing::debug!(
                per_provider = self.per_provider_timeout_ms,
                global = self.global_timeout_ms,
                "per-provider timeout exceeds global timeout; global bound applies"
            );
        }
        self.ranking.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}
