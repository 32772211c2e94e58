//! Scatter-gather across flight providers.
//!
//! One task per provider is spawned at search start. Each runs its provider
//! through the [`RetryExecutor`] under its own budget, the lesser of the
//! per-provider timeout and what is left of the global one. Outcomes flow
//! back over a single channel; the gather loop stops when every provider
//! has reported or the global deadline passes, whichever comes first.
//! Providers still running at that point are canceled and recorded as
//! timed out, and anything they send later is dropped with the channel.
//!
//! # Errors
//!
//! Only total failure escalates: [`SearchError::AllProvidersUnavailable`]
//! when zero providers succeed. A canceled or expired caller context
//! surfaces as [`SearchError::Canceled`] or [`SearchError::DeadlineExceeded`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::SearchConfig;
use crate::context::{ContextError, SearchContext};
use crate::error::{ProviderError, SearchError};
use crate::provider::FlightProvider;
use crate::retry::{RetryError, RetryExecutor, RetryPolicy};
use crate::types::{Flight, ProviderReport, SearchCriteria, SearchMetadata};

/// What one provider task produced. Consumed once by the gather loop.
#[derive(Debug)]
pub struct ProviderOutcome {
    /// Position of the provider in the orchestrator's list.
    pub index: usize,
    /// Provider id.
    pub provider: String,
    /// Flights on success, the final error otherwise.
    pub result: Result<Vec<Flight>, ProviderError>,
    /// Time spent on this provider, retries included.
    pub elapsed: Duration,
}

/// Raw results of a scatter-gather run, before validation and ranking.
#[derive(Debug, Clone)]
pub struct Gathered {
    /// Flights from every successful provider, in provider order.
    pub flights: Vec<Flight>,
    /// Counts and per-provider reports. `total_results` is the raw count.
    pub metadata: SearchMetadata,
}

/// Concurrent dispatcher over a fixed set of providers.
pub struct Orchestrator {
    providers: Vec<Arc<dyn FlightProvider>>,
    per_provider_timeout: Duration,
    global_timeout: Duration,
    retry: Arc<RetryExecutor<ProviderError>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|p| p.id()).collect();
        f.debug_struct("Orchestrator")
            .field("providers", &ids)
            .field("per_provider_timeout", &self.per_provider_timeout)
            .field("global_timeout", &self.global_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator with explicit timeouts and retry policy.
    ///
    /// [`ProviderError::Permanent`] failures are never retried.
    pub fn new(
        providers: Vec<Arc<dyn FlightProvider>>,
        per_provider_timeout: Duration,
        global_timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Self {
        let retry = RetryExecutor::new(retry_policy).with_permanent(ProviderError::is_permanent);
        Self {
            providers,
            per_provider_timeout,
            global_timeout,
            retry: Arc::new(retry),
        }
    }

    /// Create an orchestrator from a [`SearchConfig`].
    pub fn from_config(providers: Vec<Arc<dyn FlightProvider>>, config: &SearchConfig) -> Self {
        Self::new(
            providers,
            config.per_provider_timeout(),
            config.global_timeout(),
            config.retry.clone(),
        )
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query every provider concurrently and gather what arrives in time.
    ///
    /// # Errors
    ///
    /// - [`SearchError::AllProvidersUnavailable`] if no provider succeeded.
    /// - [`SearchError::Canceled`] / [`SearchError::DeadlineExceeded`] if
    ///   `ctx` stopped before gathering finished.
    pub async fn search(
        &self,
        ctx: &SearchContext,
        criteria: &SearchCriteria,
    ) -> Result<Gathered, SearchError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let started = Instant::now();
        let global_deadline = started + self.global_timeout;
        let search_ctx = ctx.child().with_deadline(global_deadline);
        let total = self.providers.len();

        let (tx, mut rx) = mpsc::channel::<ProviderOutcome>(total.max(1));
        let criteria = Arc::new(criteria.clone());

        for (index, provider) in self.providers.iter().enumerate() {
            let remaining = search_ctx.remaining().unwrap_or(self.global_timeout);
            let budget = self.per_provider_timeout.min(remaining);
            let task_ctx = search_ctx.child().with_timeout(budget);
            let provider = Arc::clone(provider);
            let retry = Arc::clone(&self.retry);
            let criteria = Arc::clone(&criteria);
            let tx = tx.clone();
            let span = tracing::debug_span!("provider_query", provider = %provider.id());

            tokio::spawn(
                async move {
                    let outcome =
                        query_provider(index, provider, &task_ctx, budget, &retry, &criteria)
                            .await;
                    // A closed channel means the gather loop already gave up on us.
                    let _ = tx.send(outcome).await;
                }
                .instrument(span),
            );
        }
        drop(tx);

        let mut slots: Vec<Option<ProviderOutcome>> = (0..total).map(|_| None).collect();
        let mut received = 0usize;

        let interrupted = loop {
            if received == total {
                break None;
            }
            tokio::select! {
                biased;
                () = ctx.done() => {
                    break Some(ctx.err().unwrap_or(ContextError::Canceled));
                }
                msg = rx.recv() => match msg {
                    Some(outcome) => {
                        let index = outcome.index;
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(outcome);
                            received += 1;
                        }
                    }
                    None => break None,
                },
                () = tokio::time::sleep_until(global_deadline) => {
                    tracing::warn!(
                        pending = total - received,
                        timeout_ms = self.global_timeout.as_millis() as u64,
                        "global search deadline reached, abandoning pending providers"
                    );
                    break None;
                }
            }
        };

        // Abandon stragglers; their late sends hit a closed channel.
        search_ctx.cancel();
        drop(rx);

        if let Some(err) = interrupted {
            tracing::debug!(reason = %err, "search interrupted by caller context");
            return Err(err.into());
        }

        self.collect(slots, started).into_result()
    }

    /// Fold provider outcomes into flights and metadata, in provider order.
    fn collect(&self, slots: Vec<Option<ProviderOutcome>>, started: Instant) -> Gathered {
        let mut flights = Vec::new();
        let mut reports = Vec::with_capacity(slots.len());
        let mut succeeded = 0usize;

        for (provider, slot) in self.providers.iter().zip(slots) {
            let outcome = slot.unwrap_or_else(|| ProviderOutcome {
                index: 0,
                provider: provider.id().to_string(),
                result: Err(ProviderError::Timeout(
                    self.per_provider_timeout.min(self.global_timeout),
                )),
                elapsed: started.elapsed(),
            });
            let elapsed_ms = outcome.elapsed.as_millis() as u64;

            match outcome.result {
                Ok(provider_flights) => {
                    succeeded += 1;
                    reports.push(ProviderReport {
                        provider: outcome.provider,
                        succeeded: true,
                        flights: provider_flights.len(),
                        error: None,
                        elapsed_ms,
                    });
                    flights.extend(provider_flights);
                }
                Err(err) => {
                    reports.push(ProviderReport {
                        provider: outcome.provider,
                        succeeded: false,
                        flights: 0,
                        error: Some(err.to_string()),
                        elapsed_ms,
                    });
                }
            }
        }

        let queried = self.providers.len();
        Gathered {
            metadata: SearchMetadata {
                providers_queried: queried,
                providers_succeeded: succeeded,
                providers_failed: queried - succeeded,
                total_results: flights.len(),
                elapsed_ms: started.elapsed().as_millis() as u64,
                providers: reports,
            },
            flights,
        }
    }
}

impl Gathered {
    /// Escalate to [`SearchError::AllProvidersUnavailable`] when nothing succeeded.
    fn into_result(self) -> Result<Self, SearchError> {
        if self.metadata.providers_succeeded > 0 {
            return Ok(self);
        }
        let detail = if self.metadata.providers.is_empty() {
            "no providers configured".to_string()
        } else {
            self.metadata
                .providers
                .iter()
                .map(|r| {
                    format!(
                        "{}: {}",
                        r.provider,
                        r.error.as_deref().unwrap_or("unknown error")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ")
        };
        Err(SearchError::AllProvidersUnavailable(detail))
    }
}

/// Run one provider under retry and its own time budget.
async fn query_provider(
    index: usize,
    provider: Arc<dyn FlightProvider>,
    ctx: &SearchContext,
    budget: Duration,
    retry: &RetryExecutor<ProviderError>,
    criteria: &SearchCriteria,
) -> ProviderOutcome {
    let started = Instant::now();
    let attempts = retry.execute(ctx, || provider.query(ctx, criteria));

    let result = match tokio::time::timeout(budget, attempts).await {
        Ok(Ok(flights)) => Ok(flights),
        Ok(Err(RetryError::Operation(ProviderError::Interrupted(ContextError::DeadlineExceeded))))
        | Ok(Err(RetryError::Interrupted(ContextError::DeadlineExceeded)))
        | Err(_) => Err(ProviderError::Timeout(budget)),
        Ok(Err(RetryError::Operation(err))) => Err(err),
        Ok(Err(RetryError::Interrupted(err))) => Err(ProviderError::Interrupted(err)),
    };
    // Release anything the provider left running on this context.
    ctx.cancel();

    let elapsed = started.elapsed();
    match &result {
        Ok(flights) => tracing::debug!(
            count = flights.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "provider returned flights"
        ),
        Err(err) => tracing::warn!(
            error = %err,
            elapsed_ms = elapsed.as_millis() as u64,
            "provider query failed"
        ),
    }

    ProviderOutcome {
        index,
        provider: provider.id().to_string(),
        result,
        elapsed,
    }
}
