//! Flight data sources wired from configuration.

pub mod fixture;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use skyscan_search::FlightProvider;

use crate::config::AppConfig;

pub use fixture::FixtureProvider;

/// Build one provider per enabled entry, in configuration order.
///
/// Relative fixture paths resolve against `base_dir`.
pub fn from_config(config: &AppConfig, base_dir: Option<&Path>) -> Vec<Arc<dyn FlightProvider>> {
    config
        .enabled_providers()
        .map(|entry| {
            let provider = FixtureProvider::new(&entry.id, entry.fixture_path(base_dir))
                .with_latency(Duration::from_millis(entry.latency_ms));
            tracing::debug!(provider = %entry.id, path = %provider.path().display(), "registered fixture provider");
            Arc::new(provider) as Arc<dyn FlightProvider>
        })
        .collect()
}
