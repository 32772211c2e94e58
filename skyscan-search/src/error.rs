//! Error types for the skyscan-search crate.
//!
//! Two layers exist. [`ProviderError`] describes one provider's failure and
//! never leaves the provider task boundary except as a line in the search
//! metadata. [`SearchError`] is what callers of the search service see.

use std::time::Duration;

use crate::context::ContextError;

/// Errors surfaced to callers of a flight search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Not a single provider produced a successful response.
    #[error("all providers unavailable: {0}")]
    AllProvidersUnavailable(String),

    /// The caller's deadline elapsed before the search completed.
    #[error("search deadline exceeded")]
    DeadlineExceeded,

    /// The caller canceled the search.
    #[error("search canceled")]
    Canceled,

    /// Search criteria failed validation.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Filter options are internally inconsistent.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl From<ContextError> for SearchError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Canceled => Self::Canceled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// A single provider's failure.
///
/// Transient and permanent failures are tagged explicitly by the provider
/// adapter; the retry executor never inspects error types beyond
/// [`ProviderError::is_permanent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// A failure worth retrying (network blip, upstream 5xx, rate limit).
    #[error("transient provider error: {0}")]
    Transient(String),

    /// A failure that will not go away on retry (bad fixture, auth rejected).
    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// The provider did not answer within its time budget.
    #[error("provider timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The provider's context was canceled or hit its deadline.
    #[error("provider interrupted: {0}")]
    Interrupted(ContextError),
}

impl ProviderError {
    /// Whether this error should stop the retry loop immediately.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
}

/// Convenience type alias for skyscan-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
