//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays a clean JSON channel for search output.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Fallback directive when the configured one does not parse.
const FALLBACK_FILTER: &str = "info";

/// Build the filter: `RUST_LOG` when set and valid, otherwise the configured directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(&config.filter))
}

/// Parse `directive`, falling back to `info` if it is malformed.
fn configured_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}' ({e}), using '{FALLBACK_FILTER}'");
        EnvFilter::new(FALLBACK_FILTER)
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(config))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }

    #[test]
    fn malformed_filter_falls_back_to_info() {
        let filter = configured_filter("skyscan=notalevel");
        assert_eq!(filter.to_string(), FALLBACK_FILTER);
    }

    #[test]
    fn configured_filter_is_kept() {
        let filter = configured_filter("skyscan=debug");
        assert_eq!(filter.to_string(), "skyscan=debug");
    }
}
