//! Structural and temporal validation of individual flights.
//!
//! A rejected flight is dropped from the batch and logged at debug level.
//! Rejection never becomes a search error; it only lowers the result count.

use crate::types::Flight;

/// Why a flight was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    /// `flight_number` is blank.
    #[error("flight number is empty")]
    EmptyFlightNumber,
    /// `airline.code` is blank.
    #[error("airline code is empty")]
    EmptyAirlineCode,
    /// `departure.airport` is blank.
    #[error("departure airport is empty")]
    EmptyDepartureAirport,
    /// `arrival.airport` is blank.
    #[error("arrival airport is empty")]
    EmptyArrivalAirport,
    /// Arrival instant is not after the departure instant.
    #[error("arrival is not after departure ({minutes} min)")]
    NonPositiveDuration {
        /// Computed duration in minutes (zero or negative).
        minutes: i64,
    },
}

/// Check a single flight.
///
/// # Errors
///
/// Returns the first [`ValidationIssue`] found.
pub fn validate(flight: &Flight) -> Result<(), ValidationIssue> {
    if flight.flight_number.trim().is_empty() {
        return Err(ValidationIssue::EmptyFlightNumber);
    }
    if flight.airline.code.trim().is_empty() {
        return Err(ValidationIssue::EmptyAirlineCode);
    }
    if flight.departure.airport.trim().is_empty() {
        return Err(ValidationIssue::EmptyDepartureAirport);
    }
    if flight.arrival.airport.trim().is_empty() {
        return Err(ValidationIssue::EmptyArrivalAirport);
    }
    if flight.arrival.time <= flight.departure.time {
        return Err(ValidationIssue::NonPositiveDuration {
            minutes: flight.computed_duration_minutes(),
        });
    }
    Ok(())
}

/// Difference between the provider-declared and computed durations, if any.
///
/// Returns `declared - computed` in minutes when they disagree. This is an
/// observation only; the computed duration is authoritative.
pub fn duration_mismatch(flight: &Flight) -> Option<i64> {
    let diff = flight.declared_duration_minutes - flight.computed_duration_minutes();
    (diff != 0).then_some(diff)
}

/// Keep only valid flights, preserving order.
pub fn retain_valid(flights: Vec<Flight>) -> Vec<Flight> {
    let before = flights.len();
    let kept: Vec<Flight> = flights
        .into_iter()
        .filter(|flight| match validate(flight) {
            Ok(()) => {
                if let Some(diff) = duration_mismatch(flight) {
                    tracing::debug!(
                        flight = %flight.id,
                        provider = %flight.provider,
                        declared = flight.declared_duration_minutes,
                        computed = flight.computed_duration_minutes(),
                        diff,
                        "declared duration disagrees with timestamps"
                    );
                }
                true
            }
            Err(issue) => {
                tracing::debug!(
                    flight = %flight.id,
                    provider = %flight.provider,
                    reason = %issue,
                    "dropping invalid flight"
                );
                false
            }
        })
        .collect();

    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), kept = kept.len(), "validation pass");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::flight;

    fn good() -> Flight {
        let mut f = flight(
            "GA410",
            "2025-12-15T08:00:00+07:00",
            "2025-12-15T10:50:00+08:00",
        );
        f.declared_duration_minutes = 110;
        f
    }

    #[test]
    fn well_formed_flight_passes() {
        assert_eq!(validate(&good()), Ok(()));
    }

    #[test]
    fn empty_identifiers_rejected() {
        let mut f = good();
        f.flight_number = "  ".into();
        assert_eq!(validate(&f), Err(ValidationIssue::EmptyFlightNumber));

        let mut f = good();
        f.airline.code.clear();
        assert_eq!(validate(&f), Err(ValidationIssue::EmptyAirlineCode));

        let mut f = good();
        f.departure.airport.clear();
        assert_eq!(validate(&f), Err(ValidationIssue::EmptyDepartureAirport));

        let mut f = good();
        f.arrival.airport.clear();
        assert_eq!(validate(&f), Err(ValidationIssue::EmptyArrivalAirport));
    }

    #[test]
    fn arrival_equal_to_departure_rejected() {
        // Same instant written in two offsets.
        let f = flight(
            "X",
            "2025-12-15T08:00:00+07:00",
            "2025-12-15T09:00:00+08:00",
        );
        assert_eq!(
            validate(&f),
            Err(ValidationIssue::NonPositiveDuration { minutes: 0 })
        );
    }

    #[test]
    fn arrival_before_departure_rejected_even_if_wall_clock_later() {
        // 09:30 local at +09:00 is 07:30 at +07:00, before the 08:00 departure.
        let f = flight(
            "X",
            "2025-12-15T08:00:00+07:00",
            "2025-12-15T09:30:00+09:00",
        );
        assert!(matches!(
            validate(&f),
            Err(ValidationIssue::NonPositiveDuration { minutes: -30 })
        ));
    }

    #[test]
    fn duration_mismatch_is_observation_only() {
        let mut f = good();
        f.declared_duration_minutes = 100;
        assert_eq!(duration_mismatch(&f), Some(-10));
        assert_eq!(validate(&f), Ok(()));
        assert_eq!(retain_valid(vec![f]).len(), 1);
    }

    #[test]
    fn matching_durations_report_no_mismatch() {
        assert_eq!(duration_mismatch(&good()), None);
    }

    #[test]
    fn retain_valid_drops_bad_and_preserves_order() {
        let mut bad = good();
        bad.id = "bad".into();
        bad.flight_number.clear();
        let mut a = good();
        a.id = "a".into();
        let mut b = good();
        b.id = "b".into();

        let kept = retain_valid(vec![a, bad, b]);
        let ids: Vec<&str> = kept.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn display_reasons() {
        assert_eq!(
            ValidationIssue::NonPositiveDuration { minutes: -5 }.to_string(),
            "arrival is not after departure (-5 min)"
        );
    }
}
