//! Trait definition for pluggable flight data providers.
//!
//! Each data source (an airline API, an aggregator, a static fixture)
//! implements [`FlightProvider`]. The search core depends only on this
//! contract, never on a fixed set of named providers.

use async_trait::async_trait;

use crate::context::SearchContext;
use crate::error::ProviderError;
use crate::types::{Flight, SearchCriteria};

/// A flight data source behind a uniform query contract.
///
/// Implementors handle their own transport and translate their wire format
/// into normalised [`Flight`] values. They should tag failures as
/// [`ProviderError::Transient`] or [`ProviderError::Permanent`] so the retry
/// executor knows whether another attempt is worthwhile.
///
/// All implementations must be `Send + Sync`; one instance is shared by
/// every concurrent search.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// Stable identifier used in logs and search metadata.
    fn id(&self) -> &str;

    /// Query flights matching `criteria`.
    ///
    /// Long-running implementations should observe `ctx` (for example via
    /// [`SearchContext::run`]) and give up once it is done.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the source cannot answer.
    async fn query(
        &self,
        ctx: &SearchContext,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Flight>, ProviderError>;
}
