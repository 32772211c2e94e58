//! Skyscan: concurrent flight search across multiple providers.
//!
//! This crate wires the [`skyscan_search`] core to the outside world:
//! - **Configuration**: TOML file with search, provider and logging settings
//! - **Providers**: fixture-backed flight sources with simulated latency
//! - **Logging**: `tracing` subscriber writing to stderr
//!
//! The `skyscan` binary puts these together behind a command line.

pub mod config;
pub mod error;
pub mod logging;
pub mod providers;

pub use config::{AppConfig, LoggingConfig, ProviderConfig};
pub use error::{AppError, Result};
pub use providers::FixtureProvider;

use std::path::Path;

use skyscan_search::FlightSearch;

/// Build a [`FlightSearch`] from a validated application config.
///
/// Relative fixture paths resolve against `base_dir`, normally the
/// directory holding the config file.
///
/// # Errors
///
/// Returns [`AppError::Config`] or [`AppError::Search`] if validation fails.
pub fn build_search(config: &AppConfig, base_dir: Option<&Path>) -> Result<FlightSearch> {
    config.validate()?;
    let providers = providers::from_config(config, base_dir);
    Ok(FlightSearch::new(providers, config.search.clone())?)
}
