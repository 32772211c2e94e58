//! Integration tests for configuration loading and fixture-backed search.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use skyscan::{AppConfig, AppError, ProviderConfig, build_search};
use skyscan_search::{
    CabinClass, FilterOptions, SearchContext, SearchCriteria, SearchError, SortBy,
};
use tempfile::TempDir;

fn repo_fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn criteria() -> SearchCriteria {
    SearchCriteria {
        origin: "CGK".into(),
        destination: "DPS".into(),
        departure_date: NaiveDate::from_ymd_opt(2025, 12, 15).expect("valid date"),
        passengers: 1,
        cabin_class: CabinClass::Economy,
    }
}

/// Default config pointing at the repository fixtures, with no latency.
fn repo_config() -> AppConfig {
    let mut config = AppConfig::default();
    for provider in &mut config.providers {
        provider.latency_ms = 0;
    }
    config
}

#[test]
fn config_roundtrip_through_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.search.global_timeout_ms = 4_000;
    config.search.ranking.price = 0.6;
    config.search.ranking.duration = 0.2;
    config.providers.push(ProviderConfig::fixture("extra", "/srv/extra.json", 10));
    config.save_to_file(&path).expect("failed to save config");

    let loaded = AppConfig::from_file(&path).expect("failed to load config");
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn invalid_toml_is_a_config_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "this is not valid toml {{{").expect("failed to write file");
    assert!(matches!(AppConfig::from_file(&path), Err(AppError::Config(_))));
}

#[test]
fn build_search_rejects_invalid_config() {
    let mut config = AppConfig::default();
    config.providers.clear();
    let err = build_search(&config, None).unwrap_err();
    assert!(err.to_string().contains("at least one provider"));
}

#[tokio::test]
async fn searches_repository_fixtures() {
    let search = build_search(&repo_config(), Some(Path::new(env!("CARGO_MANIFEST_DIR"))))
        .expect("valid config");
    let response = search
        .search(
            &SearchContext::new(),
            &criteria(),
            &FilterOptions::default(),
            SortBy::Price,
        )
        .await
        .expect("search succeeds");

    assert_eq!(response.metadata.providers_queried, 3);
    assert_eq!(response.metadata.providers_succeeded, 3);
    assert!(!response.flights.is_empty());
    assert_eq!(response.metadata.total_results, response.flights.len());

    // Economy only, valid only, cheapest first.
    assert!(response.flights.iter().all(|f| f.cabin_class == CabinClass::Economy));
    assert!(response.flights.iter().all(|f| f.arrival.time > f.departure.time));
    assert!(
        response
            .flights
            .windows(2)
            .all(|w| w[0].price.amount <= w[1].price.amount)
    );
}

#[tokio::test]
async fn filters_apply_to_fixture_results() {
    let search = build_search(&repo_config(), Some(Path::new(env!("CARGO_MANIFEST_DIR"))))
        .expect("valid config");
    let filters = FilterOptions {
        max_stops: Some(0),
        airlines: vec!["qz".into()],
        ..Default::default()
    };
    let response = search
        .search(&SearchContext::new(), &criteria(), &filters, SortBy::Departure)
        .await
        .expect("search succeeds");
    assert!(!response.flights.is_empty());
    assert!(response.flights.iter().all(|f| f.airline.code == "QZ" && f.stops == 0));
}

#[tokio::test]
async fn missing_fixture_degrades_to_partial_results() {
    let mut config = repo_config();
    config.providers[0].fixture = repo_fixtures().join("does-not-exist.json");
    let search = build_search(&config, Some(Path::new(env!("CARGO_MANIFEST_DIR"))))
        .expect("valid config");
    let response = search
        .search(
            &SearchContext::new(),
            &criteria(),
            &FilterOptions::default(),
            SortBy::Best,
        )
        .await
        .expect("two providers still answer");
    assert_eq!(response.metadata.providers_succeeded, 2);
    assert_eq!(response.metadata.providers_failed, 1);
    let report = &response.metadata.providers[0];
    assert!(!report.succeeded);
    assert!(report.error.as_deref().unwrap_or_default().contains("fixture not found"));
}

#[tokio::test]
async fn every_fixture_missing_is_unavailable() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = repo_config();
    let err = build_search(&config, Some(dir.path()))
        .expect("valid config")
        .search(
            &SearchContext::new(),
            &criteria(),
            &FilterOptions::default(),
            SortBy::Best,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::AllProvidersUnavailable(_)));
}

#[tokio::test]
async fn custom_fixture_in_temp_dir() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(
        dir.path().join("mini.json"),
        r#"{"flights": [{
            "id": "1", "airline_code": "ID", "airline_name": "Batik Air",
            "flight_number": "ID6500", "origin": "CGK", "destination": "DPS",
            "departure": "2025-12-15T10:00:00+07:00", "arrival": "2025-12-15T12:55:00+08:00",
            "duration_minutes": 115, "price": 890000, "seats": 3
        }]}"#,
    )
    .expect("failed to write fixture");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[providers]]
id = "batik"
fixture = "mini.json"
"#,
    )
    .expect("failed to write config");

    let config = AppConfig::from_file(&config_path).expect("failed to load config");
    let search = build_search(&config, config_path.parent()).expect("valid config");
    let response = search
        .search(
            &SearchContext::new(),
            &criteria(),
            &FilterOptions::default(),
            SortBy::Best,
        )
        .await
        .expect("search succeeds");
    assert_eq!(response.flights.len(), 1);
    let flight = &response.flights[0];
    assert_eq!(flight.id, "batik-1");
    assert_eq!(flight.computed_duration_minutes(), 115);
    assert!((flight.score - 1.0).abs() < 1e-9);
}
