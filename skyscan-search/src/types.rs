//! Core types for flight search criteria, results, and run metadata.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SearchError;

/// Most passengers a single search may request.
pub const MAX_PASSENGERS: u32 = 9;

/// Cabin class requested by the traveller and offered by a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    /// Standard seating.
    #[default]
    Economy,
    /// Extra legroom economy.
    PremiumEconomy,
    /// Business class.
    Business,
    /// First class.
    First,
}

impl CabinClass {
    /// Returns the wire name of this cabin class.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::PremiumEconomy => "premium_economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CabinClass {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "premium_economy" | "premium-economy" => Ok(Self::PremiumEconomy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            other => Err(SearchError::InvalidCriteria(format!(
                "unknown cabin class '{other}'"
            ))),
        }
    }
}

/// What the traveller is looking for. Read-only once a search starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Origin airport (IATA code).
    pub origin: String,
    /// Destination airport (IATA code).
    pub destination: String,
    /// Local departure date at the origin.
    pub departure_date: NaiveDate,
    /// Number of travelling passengers.
    pub passengers: u32,
    /// Requested cabin class.
    #[serde(default)]
    pub cabin_class: CabinClass,
}

impl SearchCriteria {
    /// Validates the criteria before a search is dispatched.
    ///
    /// Checks:
    /// - `origin` and `destination` are 3-letter uppercase IATA codes
    /// - `origin` differs from `destination`
    /// - `passengers` is between 1 and [`MAX_PASSENGERS`]
    ///
    /// The search service itself trusts its input; this is the upstream
    /// check callers run when building criteria from user input.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !is_iata_code(&self.origin) {
            return Err(SearchError::InvalidCriteria(
                "origin must be a 3-letter IATA airport code".into(),
            ));
        }
        if !is_iata_code(&self.destination) {
            return Err(SearchError::InvalidCriteria(
                "destination must be a 3-letter IATA airport code".into(),
            ));
        }
        if self.origin == self.destination {
            return Err(SearchError::InvalidCriteria(
                "origin and destination must differ".into(),
            ));
        }
        if self.passengers == 0 || self.passengers > MAX_PASSENGERS {
            return Err(SearchError::InvalidCriteria(format!(
                "passengers must be between 1 and {MAX_PASSENGERS}"
            )));
        }
        Ok(())
    }
}

fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Operating airline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    /// Two-character airline designator, e.g. `GA`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// One end of a flight: airport and local wall-clock time with its offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightEndpoint {
    /// Airport IATA code.
    pub airport: String,
    /// Local time at the airport, including its UTC offset.
    pub time: DateTime<FixedOffset>,
}

/// Fare for the whole party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in whole currency units.
    pub amount: u64,
    /// ISO 4217 currency code.
    pub currency: String,
}

/// Included baggage allowance, as described by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baggage {
    /// Cabin allowance, e.g. `"7 kg"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
    /// Checked allowance, e.g. `"20 kg"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<String>,
}

/// A normalised flight offer.
///
/// Built by a provider adapter. The search pipeline never changes its
/// business fields; it only validates it, attaches [`score`](Self::score),
/// and reorders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Identity, unique within a provider. Final tie-breaker when sorting.
    pub id: String,
    /// Id of the provider that returned this flight.
    pub provider: String,
    /// Operating airline.
    pub airline: Airline,
    /// Marketing flight number, e.g. `GA410`.
    pub flight_number: String,
    /// Departure airport and local time.
    pub departure: FlightEndpoint,
    /// Arrival airport and local time.
    pub arrival: FlightEndpoint,
    /// Duration in minutes as declared by the provider. Informational only.
    pub declared_duration_minutes: i64,
    /// Number of intermediate stops.
    pub stops: u32,
    /// Total fare.
    pub price: Price,
    /// Seats still available at this fare.
    pub available_seats: u32,
    /// Cabin class of the fare.
    pub cabin_class: CabinClass,
    /// Ancillary descriptors (wifi, meal, power outlets, ...).
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Included baggage.
    #[serde(default)]
    pub baggage: Baggage,
    /// Best-value score in `[0, 1]`, relative to the batch it was ranked in.
    #[serde(default)]
    pub score: f64,
}

impl Flight {
    /// Elapsed minutes between departure and arrival instants.
    ///
    /// Offsets are honoured, so a flight crossing time zones gets its true
    /// airborne duration. This value, not the declared one, is used for
    /// filtering and ranking.
    pub fn computed_duration_minutes(&self) -> i64 {
        (self.arrival.time - self.departure.time).num_minutes()
    }
}

/// Per-provider line in the search metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReport {
    /// Provider id.
    pub provider: String,
    /// Whether the provider answered successfully.
    pub succeeded: bool,
    /// Raw flights returned (before validation and filtering).
    pub flights: usize,
    /// Failure description when `succeeded` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time spent on this provider, in milliseconds.
    pub elapsed_ms: u64,
}

/// Summary of one search run. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// Providers dispatched.
    pub providers_queried: usize,
    /// Providers that answered successfully (possibly with zero flights).
    pub providers_succeeded: usize,
    /// `providers_queried - providers_succeeded`.
    pub providers_failed: usize,
    /// Flights in the final response.
    pub total_results: usize,
    /// Wall time of the whole search, in milliseconds.
    pub elapsed_ms: u64,
    /// Per-provider breakdown, in provider registration order.
    pub providers: Vec<ProviderReport>,
}

/// Final search response: ordered flights plus run metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Validated, filtered, scored and sorted flights.
    pub flights: Vec<Flight>,
    /// Run metadata.
    pub metadata: SearchMetadata,
}
