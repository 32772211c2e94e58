//! # skyscan-search
//!
//! Concurrent multi-provider flight search.
//!
//! A search fans out to every registered [`FlightProvider`] at once, retries
//! transient failures with capped exponential backoff, and gathers whatever
//! arrives within the configured time bounds. The merged batch is then
//! validated, narrowed by the caller's filters, scored for best value, and
//! put in a fully deterministic order.
//!
//! ## Design
//!
//! - Providers are pluggable behind one async trait; the core never names them
//! - Per-provider timeout plus a global deadline; stragglers are canceled
//! - Partial failure is success: only zero successful providers is an error
//! - Scores are relative to the batch they were computed for
//! - Output order does not depend on which provider answered first
//!
//! ## Logging
//!
//! Provider failures are logged at `warn`, search summaries at `info`.
//! Search criteria only ever appear at `debug`.

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod retry;
pub mod types;

use std::sync::Arc;

use tokio::time::Instant;

pub use config::SearchConfig;
pub use context::{ContextError, SearchContext};
pub use error::{ProviderError, Result, SearchError};
pub use orchestrator::dispatch::Orchestrator;
pub use orchestrator::filter::{DurationRange, FilterOptions, TimeRange};
pub use orchestrator::ranking::RankingWeights;
pub use orchestrator::sort::SortBy;
pub use provider::FlightProvider;
pub use retry::{RetryError, RetryExecutor, RetryPolicy};
pub use types::{
    Airline, Baggage, CabinClass, Flight, FlightEndpoint, Price, ProviderReport, SearchCriteria,
    SearchMetadata, SearchResponse,
};

/// Flight search service over a fixed set of providers.
///
/// Cheap to share behind an `Arc`; concurrent searches do not interfere.
#[derive(Debug)]
pub struct FlightSearch {
    orchestrator: Orchestrator,
    config: SearchConfig,
}

impl FlightSearch {
    /// Create a search service.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn new(providers: Vec<Arc<dyn FlightProvider>>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            orchestrator: Orchestrator::from_config(providers, &config),
            config,
        })
    }

    /// The configuration this service runs with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search every provider and return validated, filtered, ranked flights.
    ///
    /// `criteria` is trusted: callers building it from user input should run
    /// [`SearchCriteria::validate`] first.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidFilter`] if `filters` is inconsistent.
    /// - [`SearchError::AllProvidersUnavailable`] if every provider failed.
    /// - [`SearchError::Canceled`] / [`SearchError::DeadlineExceeded`] if
    ///   `ctx` stopped first.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use skyscan_search::*;
    /// # async fn example(providers: Vec<Arc<dyn FlightProvider>>) -> Result<()> {
    /// let search = FlightSearch::new(providers, SearchConfig::default())?;
    /// let criteria = SearchCriteria {
    ///     origin: "CGK".into(),
    ///     destination: "DPS".into(),
    ///     departure_date: chrono::NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(),
    ///     passengers: 1,
    ///     cabin_class: CabinClass::Economy,
    /// };
    /// let response = search
    ///     .search(&SearchContext::new(), &criteria, &FilterOptions::default(), SortBy::Price)
    ///     .await?;
    /// for flight in &response.flights {
    ///     println!("{} {} {}", flight.flight_number, flight.price.amount, flight.price.currency);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(
        &self,
        ctx: &SearchContext,
        criteria: &SearchCriteria,
        filters: &FilterOptions,
        sort_by: SortBy,
    ) -> Result<SearchResponse> {
        filters.validate()?;
        let started = Instant::now();
        tracing::debug!(
            origin = %criteria.origin,
            destination = %criteria.destination,
            date = %criteria.departure_date,
            passengers = criteria.passengers,
            cabin = %criteria.cabin_class,
            providers = self.orchestrator.provider_count(),
            "starting flight search"
        );

        let gathered = self.orchestrator.search(ctx, criteria).await?;
        let raw = gathered.flights.len();

        let flights = orchestrator::validate::retain_valid(gathered.flights);
        let valid = flights.len();
        let flights = orchestrator::filter::apply(flights, filters);
        let mut flights = orchestrator::ranking::rank(flights, &self.config.ranking);
        orchestrator::sort::sort_flights(&mut flights, sort_by);

        let mut metadata = gathered.metadata;
        metadata.total_results = flights.len();
        metadata.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            providers_queried = metadata.providers_queried,
            providers_succeeded = metadata.providers_succeeded,
            providers_failed = metadata.providers_failed,
            raw,
            valid,
            results = metadata.total_results,
            elapsed_ms = metadata.elapsed_ms,
            sort = %sort_by,
            "flight search complete"
        );

        Ok(SearchResponse { flights, metadata })
    }
}
