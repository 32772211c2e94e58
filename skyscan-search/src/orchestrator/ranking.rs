//! Best-value scoring relative to the current result batch.
//!
//! Each flight gets a composite score in `[0, 1]`:
//!
//! ```text
//! price_score    = 1 - (price - min_price) / (max_price - min_price)
//! duration_score = 1 - (duration - min_duration) / (max_duration - min_duration)
//! stops_score    = 1 / (1 + stops)
//! score          = w_price * price_score + w_duration * duration_score + w_stops * stops_score
//! ```
//!
//! A component whose batch range is zero (all values equal) scores 1.0.
//! Scores are only comparable within the batch they were computed for.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::Flight;

/// Tolerance when checking that weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative importance of each score component. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    /// Weight of the normalised price component.
    pub price: f64,
    /// Weight of the normalised duration component.
    pub duration: f64,
    /// Weight of the stop-count component.
    pub stops: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            price: 0.5,
            duration: 0.3,
            stops: 0.2,
        }
    }
}

impl RankingWeights {
    /// Validates the weights.
    ///
    /// Checks:
    /// - every weight is finite and non-negative
    /// - the weights sum to 1 (within a small tolerance)
    pub fn validate(&self) -> Result<(), SearchError> {
        for (name, value) in [
            ("price", self.price),
            ("duration", self.duration),
            ("stops", self.stops),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::Config(format!(
                    "ranking weight '{name}' must be a non-negative number"
                )));
            }
        }
        let sum = self.price + self.duration + self.stops;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SearchError::Config(format!(
                "ranking weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Price and duration extremes observed in one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Cheapest fare in the batch.
    pub min_price: u64,
    /// Most expensive fare in the batch.
    pub max_price: u64,
    /// Shortest computed duration in the batch, in minutes.
    pub min_duration: i64,
    /// Longest computed duration in the batch, in minutes.
    pub max_duration: i64,
}

impl BatchStats {
    /// Collect extremes from `flights`. Returns `None` for an empty batch.
    pub fn from_flights(flights: &[Flight]) -> Option<Self> {
        let first = flights.first()?;
        let first_duration = first.computed_duration_minutes();
        let seed = Self {
            min_price: first.price.amount,
            max_price: first.price.amount,
            min_duration: first_duration,
            max_duration: first_duration,
        };
        Some(flights.iter().skip(1).fold(seed, |acc, flight| {
            let duration = flight.computed_duration_minutes();
            Self {
                min_price: acc.min_price.min(flight.price.amount),
                max_price: acc.max_price.max(flight.price.amount),
                min_duration: acc.min_duration.min(duration),
                max_duration: acc.max_duration.max(duration),
            }
        }))
    }
}

/// Normalise `value` into `[0, 1]` with lower values scoring higher.
fn inverse_normalise(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 1.0;
    }
    (1.0 - (value - min) / span).clamp(0.0, 1.0)
}

/// Composite best-value score for one flight within its batch.
///
/// Higher is better.
pub fn score(flight: &Flight, stats: &BatchStats, weights: &RankingWeights) -> f64 {
    let price_score = inverse_normalise(
        flight.price.amount as f64,
        stats.min_price as f64,
        stats.max_price as f64,
    );
    let duration_score = inverse_normalise(
        flight.computed_duration_minutes() as f64,
        stats.min_duration as f64,
        stats.max_duration as f64,
    );
    let stops_score = 1.0 / (1.0 + f64::from(flight.stops));

    weights.price * price_score + weights.duration * duration_score + weights.stops * stops_score
}

/// Attach a batch-relative score to every flight.
pub fn rank(mut flights: Vec<Flight>, weights: &RankingWeights) -> Vec<Flight> {
    let Some(stats) = BatchStats::from_flights(&flights) else {
        return flights;
    };
    for flight in &mut flights {
        flight.score = score(flight, &stats, weights);
    }
    flights
}
