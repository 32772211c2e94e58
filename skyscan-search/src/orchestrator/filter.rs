//! User-supplied predicates that narrow a validated flight batch.
//!
//! Every predicate is optional and vacuously true when absent; present
//! predicates combine with logical AND. Filtering is order-preserving and
//! never adds flights, so `apply(f, &FilterOptions::default()) == f`.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::Flight;

/// Half-open time-of-day window `[start, end)`.
///
/// Compared against each flight's own local wall-clock time; date and UTC
/// offset are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub start: NaiveTime,
    /// Exclusive upper bound.
    pub end: NaiveTime,
}

impl TimeRange {
    /// Build a range, rejecting `start >= end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SearchError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Checks that `start < end`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.start >= self.end {
            return Err(SearchError::InvalidFilter(format!(
                "time range start {} must be before end {}",
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )));
        }
        Ok(())
    }

    /// Whether `time` falls within `[start, end)`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// Inclusive duration bounds in minutes; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest acceptable duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_minutes: Option<i64>,
    /// Longest acceptable duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_minutes: Option<i64>,
}

impl DurationRange {
    /// Build a range, rejecting `min > max` when both are present.
    pub fn new(min_minutes: Option<i64>, max_minutes: Option<i64>) -> Result<Self, SearchError> {
        let range = Self {
            min_minutes,
            max_minutes,
        };
        range.validate()?;
        Ok(range)
    }

    /// Checks that `min <= max` when both bounds are set.
    pub fn validate(&self) -> Result<(), SearchError> {
        if let (Some(min), Some(max)) = (self.min_minutes, self.max_minutes) {
            if min > max {
                return Err(SearchError::InvalidFilter(format!(
                    "duration min {min} must be <= max {max}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `minutes` satisfies every bound present.
    pub fn contains(&self, minutes: i64) -> bool {
        self.min_minutes.is_none_or(|min| minutes >= min)
            && self.max_minutes.is_none_or(|max| minutes <= max)
    }
}

/// Optional narrowing predicates. The default value filters nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Highest acceptable fare.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    /// Most acceptable stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,
    /// Airline codes to keep. Empty means any airline.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub airlines: Vec<String>,
    /// Local departure time-of-day window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<TimeRange>,
    /// Local arrival time-of-day window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<TimeRange>,
    /// Computed duration bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationRange>,
}

impl FilterOptions {
    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validates the time and duration ranges.
    pub fn validate(&self) -> Result<(), SearchError> {
        if let Some(range) = &self.departure_time {
            range.validate()?;
        }
        if let Some(range) = &self.arrival_time {
            range.validate()?;
        }
        if let Some(range) = &self.duration {
            range.validate()?;
        }
        Ok(())
    }

    /// Whether `flight` passes every predicate present.
    pub fn matches(&self, flight: &Flight) -> bool {
        if self.max_price.is_some_and(|max| flight.price.amount > max) {
            return false;
        }
        if self.max_stops.is_some_and(|max| flight.stops > max) {
            return false;
        }
        if !self.airlines.is_empty()
            && !self
                .airlines
                .iter()
                .any(|code| code.trim().eq_ignore_ascii_case(&flight.airline.code))
        {
            return false;
        }
        if self
            .departure_time
            .is_some_and(|range| !range.contains(flight.departure.time.time()))
        {
            return false;
        }
        if self
            .arrival_time
            .is_some_and(|range| !range.contains(flight.arrival.time.time()))
        {
            return false;
        }
        if self
            .duration
            .is_some_and(|range| !range.contains(flight.computed_duration_minutes()))
        {
            return false;
        }
        true
    }
}

/// Keep the flights that satisfy `options`, preserving their order.
pub fn apply(flights: Vec<Flight>, options: &FilterOptions) -> Vec<Flight> {
    if options.is_empty() {
        return flights;
    }
    let before = flights.len();
    let kept: Vec<Flight> = flights
        .into_iter()
        .filter(|flight| options.matches(flight))
        .collect();
    tracing::debug!(before, after = kept.len(), "filters applied");
    kept
}
