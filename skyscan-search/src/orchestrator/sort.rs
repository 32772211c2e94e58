//! Final deterministic ordering of a search response.
//!
//! Every sort key ends with the flight identity (then provider id), so the
//! output order is fully determined even with equal primary keys or a
//! different provider completion order.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::Flight;

/// Requested response ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Highest best-value score first.
    #[default]
    Best,
    /// Cheapest first.
    Price,
    /// Shortest computed duration first.
    Duration,
    /// Earliest departure instant first.
    Departure,
}

impl SortBy {
    /// Returns the wire name of this ordering.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Price => "price",
            Self::Duration => "duration",
            Self::Departure => "departure",
        }
    }

    /// Compare two flights under this ordering, including the identity tie-break.
    pub fn compare(&self, a: &Flight, b: &Flight) -> Ordering {
        let primary = match self {
            Self::Best => b.score.total_cmp(&a.score),
            Self::Price => a.price.amount.cmp(&b.price.amount),
            Self::Duration => a
                .computed_duration_minutes()
                .cmp(&b.computed_duration_minutes()),
            Self::Departure => a.departure.time.cmp(&b.departure.time),
        };
        primary
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.provider.cmp(&b.provider))
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SortBy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "price" => Ok(Self::Price),
            "duration" => Ok(Self::Duration),
            "departure" => Ok(Self::Departure),
            other => Err(SearchError::InvalidFilter(format!(
                "unknown sort order '{other}'"
            ))),
        }
    }
}

/// Sort `flights` in place under `sort_by`.
pub fn sort_flights(flights: &mut [Flight], sort_by: SortBy) {
    flights.sort_by(|a, b| sort_by.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::flight;

    fn make(id: &str, dep: &str, arr: &str, price: u64, score: f64) -> Flight {
        let mut f = flight(id, dep, arr);
        f.price.amount = price;
        f.score = score;
        f
    }

    fn batch() -> Vec<Flight> {
        vec![
            // 180 min
            make("c", "2025-12-15T09:00:00+07:00", "2025-12-15T13:00:00+08:00", 900_000, 0.4),
            // 120 min
            make("a", "2025-12-15T12:00:00+07:00", "2025-12-15T15:00:00+08:00", 500_000, 0.9),
            // 120 min, same price as "a"
            make("b", "2025-12-15T06:00:00+07:00", "2025-12-15T09:00:00+08:00", 500_000, 0.9),
        ]
    }

    fn ids(flights: &[Flight]) -> Vec<&str> {
        flights.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn best_orders_score_descending_with_id_tiebreak() {
        let mut flights = batch();
        sort_flights(&mut flights, SortBy::Best);
        assert_eq!(ids(&flights), vec!["a", "b", "c"]);
    }

    #[test]
    fn price_orders_ascending_with_id_tiebreak() {
        let mut flights = batch();
        sort_flights(&mut flights, SortBy::Price);
        assert_eq!(ids(&flights), vec!["a", "b", "c"]);
    }

    #[test]
    fn duration_orders_by_computed_minutes() {
        let mut flights = batch();
        sort_flights(&mut flights, SortBy::Duration);
        assert_eq!(ids(&flights), vec!["a", "b", "c"]);
    }

    #[test]
    fn departure_orders_by_instant() {
        let mut flights = batch();
        sort_flights(&mut flights, SortBy::Departure);
        assert_eq!(ids(&flights), vec!["b", "c", "a"]);
    }

    #[test]
    fn departure_compares_instants_not_wall_clock() {
        // 09:00 at +09:00 is 07:00 at +07:00, so it departs first.
        let mut flights = vec![
            make("west", "2025-12-15T08:00:00+07:00", "2025-12-15T10:00:00+07:00", 1, 0.0),
            make("east", "2025-12-15T09:00:00+09:00", "2025-12-15T11:00:00+09:00", 1, 0.0),
        ];
        sort_flights(&mut flights, SortBy::Departure);
        assert_eq!(ids(&flights), vec!["east", "west"]);
    }

    #[test]
    fn sorting_is_independent_of_input_order() {
        for sort_by in [SortBy::Best, SortBy::Price, SortBy::Duration, SortBy::Departure] {
            let mut forward = batch();
            let mut reversed: Vec<Flight> = batch().into_iter().rev().collect();
            sort_flights(&mut forward, sort_by);
            sort_flights(&mut reversed, sort_by);
            assert_eq!(ids(&forward), ids(&reversed), "order differs for {sort_by}");
        }
    }

    #[test]
    fn same_id_from_two_providers_orders_by_provider() {
        let mut x = make("dup", "2025-12-15T08:00:00+07:00", "2025-12-15T10:00:00+07:00", 1, 0.5);
        x.provider = "zeta".into();
        let mut y = x.clone();
        y.provider = "alpha".into();
        let mut flights = vec![x, y];
        sort_flights(&mut flights, SortBy::Price);
        assert_eq!(flights[0].provider, "alpha");
    }

    #[test]
    fn parse_and_display_round_trip_names() {
        for name in ["best", "price", "duration", "departure"] {
            let parsed: SortBy = name.parse().expect("known order");
            assert_eq!(parsed.to_string(), name);
        }
        assert!("cheapest".parse::<SortBy>().is_err());
        assert_eq!(SortBy::default(), SortBy::Best);
    }
}
