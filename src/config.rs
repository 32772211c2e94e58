//! Application configuration loaded from TOML.
//!
//! ```toml
//! [search]
//! per_provider_timeout_ms = 2000
//! global_timeout_ms = 5000
//!
//! [search.ranking]
//! price = 0.5
//! duration = 0.3
//! stops = 0.2
//!
//! [[providers]]
//! id = "garuda"
//! fixture = "fixtures/garuda.json"
//! latency_ms = 120
//!
//! [logging]
//! filter = "skyscan=info,skyscan_search=info"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skyscan_search::SearchConfig;

use crate::error::{AppError, Result};

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "skyscan=info,skyscan_search=info";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Search core settings.
    pub search: SearchConfig,
    /// Flight data sources, queried in this order.
    pub providers: Vec<ProviderConfig>,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            providers: vec![
                ProviderConfig::fixture("garuda", "fixtures/garuda.json", 120),
                ProviderConfig::fixture("lion", "fixtures/lion.json", 250),
                ProviderConfig::fixture("airasia", "fixtures/airasia.json", 80),
            ],
            logging: LoggingConfig::default(),
        }
    }
}

/// One fixture-backed flight data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Stable provider id, reported in search metadata.
    pub id: String,
    /// JSON fixture path. Relative paths resolve against the config file's directory.
    pub fixture: PathBuf,
    /// Simulated response latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
    /// Disabled providers are skipped entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// An enabled fixture provider.
    pub fn fixture(id: &str, fixture: impl Into<PathBuf>, latency_ms: u64) -> Self {
        Self {
            id: id.to_string(),
            fixture: fixture.into(),
            latency_ms,
            enabled: true,
        }
    }

    /// Resolve the fixture path against `base_dir` when it is relative.
    pub fn fixture_path(&self, base_dir: Option<&Path>) -> PathBuf {
        match base_dir {
            Some(base) if self.fixture.is_relative() => base.join(&self.fixture),
            _ => self.fixture.clone(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/skyscan/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("skyscan").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("skyscan")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/skyscan-config/config.toml")
        }
    }

    /// Providers that will actually be queried.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - the search core settings are valid
    /// - every provider id is non-empty and unique
    /// - at least one provider is enabled
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            let id = provider.id.trim();
            if id.is_empty() {
                return Err(AppError::Config("provider id must not be empty".into()));
            }
            if !seen.insert(id) {
                return Err(AppError::Config(format!("duplicate provider id '{id}'")));
            }
        }
        if self.enabled_providers().next().is_none() {
            return Err(AppError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        Ok(())
    }
}
