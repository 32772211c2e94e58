//! Provider backed by a JSON fixture file.
//!
//! The file holds raw provider records:
//!
//! ```json
//! {
//!   "flights": [
//!     {
//!       "id": "GA400-1215",
//!       "airline_code": "GA",
//!       "airline_name": "Garuda Indonesia",
//!       "flight_number": "GA400",
//!       "origin": "CGK",
//!       "destination": "DPS",
//!       "departure": "2025-12-15T06:00:00+07:00",
//!       "arrival": "2025-12-15T08:50:00+08:00",
//!       "duration_minutes": 110,
//!       "stops": 0,
//!       "price": 1250000,
//!       "currency": "IDR",
//!       "seats": 12,
//!       "cabin": "economy",
//!       "amenities": ["meal"],
//!       "baggage": { "cabin": "7 kg", "checked": "20 kg" }
//!     }
//!   ]
//! }
//! ```
//!
//! The file is re-read on every query, so edits take effect without a restart.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use skyscan_search::{
    Airline, Baggage, CabinClass, Flight, FlightEndpoint, FlightProvider, Price, ProviderError,
    SearchContext, SearchCriteria,
};

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    flights: Vec<RawFlight>,
}

#[derive(Debug, Deserialize)]
struct RawFlight {
    id: String,
    airline_code: String,
    #[serde(default)]
    airline_name: String,
    flight_number: String,
    origin: String,
    destination: String,
    departure: String,
    arrival: String,
    #[serde(default)]
    duration_minutes: i64,
    #[serde(default)]
    stops: u32,
    price: u64,
    #[serde(default = "default_currency")]
    currency: String,
    #[serde(default)]
    seats: u32,
    #[serde(default)]
    cabin: Option<String>,
    #[serde(default)]
    amenities: Vec<String>,
    #[serde(default)]
    baggage: Baggage,
}

fn default_currency() -> String {
    "IDR".to_string()
}

/// Serves flights from a local JSON file.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    id: String,
    path: PathBuf,
    latency: Duration,
}

impl FixtureProvider {
    /// Create a provider reading `path`, with no simulated latency.
    pub fn new(id: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.to_string(),
            path: path.into(),
            latency: Duration::ZERO,
        }
    }

    /// Delay every answer by `latency`, as a remote source would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fixture file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<FixtureFile, ProviderError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProviderError::Permanent(format!(
                    "fixture not found: {}",
                    self.path.display()
                )),
                _ => ProviderError::Transient(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )),
            })?;
        serde_json::from_str(&content).map_err(|e| {
            ProviderError::Permanent(format!("malformed fixture {}: {e}", self.path.display()))
        })
    }

    /// Turn a raw record into a [`Flight`], or `None` if its timestamps or
    /// cabin cannot be parsed.
    fn normalize(&self, raw: RawFlight) -> Option<Flight> {
        let departure = match DateTime::parse_from_rfc3339(&raw.departure) {
            Ok(time) => time,
            Err(e) => {
                tracing::warn!(provider = %self.id, record = %raw.id, error = %e, "skipping record with bad departure time");
                return None;
            }
        };
        let arrival = match DateTime::parse_from_rfc3339(&raw.arrival) {
            Ok(time) => time,
            Err(e) => {
                tracing::warn!(provider = %self.id, record = %raw.id, error = %e, "skipping record with bad arrival time");
                return None;
            }
        };
        let cabin_class = match raw.cabin.as_deref().map(str::parse::<CabinClass>) {
            None => CabinClass::default(),
            Some(Ok(cabin)) => cabin,
            Some(Err(e)) => {
                tracing::warn!(provider = %self.id, record = %raw.id, error = %e, "skipping record with unknown cabin");
                return None;
            }
        };

        Some(Flight {
            id: format!("{}-{}", self.id, raw.id),
            provider: self.id.clone(),
            airline: Airline {
                code: raw.airline_code,
                name: raw.airline_name,
            },
            flight_number: raw.flight_number,
            departure: FlightEndpoint {
                airport: raw.origin,
                time: departure,
            },
            arrival: FlightEndpoint {
                airport: raw.destination,
                time: arrival,
            },
            declared_duration_minutes: raw.duration_minutes,
            stops: raw.stops,
            price: Price {
                amount: raw.price,
                currency: raw.currency,
            },
            available_seats: raw.seats,
            cabin_class,
            amenities: raw.amenities,
            baggage: raw.baggage,
            score: 0.0,
        })
    }
}

/// Whether `flight` answers `criteria`: route, local departure date, cabin and seats.
fn matches_criteria(flight: &Flight, criteria: &SearchCriteria) -> bool {
    flight.departure.airport == criteria.origin
        && flight.arrival.airport == criteria.destination
        && flight.departure.time.date_naive() == criteria.departure_date
        && flight.cabin_class == criteria.cabin_class
        && flight.available_seats >= criteria.passengers
}

#[async_trait]
impl FlightProvider for FixtureProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn query(
        &self,
        ctx: &SearchContext,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Flight>, ProviderError> {
        if !self.latency.is_zero() {
            ctx.run(tokio::time::sleep(self.latency))
                .await
                .map_err(ProviderError::Interrupted)?;
        }

        let file = self.load().await?;
        let total = file.flights.len();
        let flights: Vec<Flight> = file
            .flights
            .into_iter()
            .filter_map(|raw| self.normalize(raw))
            .filter(|flight| matches_criteria(flight, criteria))
            .collect();

        tracing::debug!(provider = %self.id, total, matched = flights.len(), "fixture query");
        Ok(flights)
    }
}
