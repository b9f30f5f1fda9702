//! Per-airport movement summaries.
//!
//! Airports are never entered by hand. Each record is derived from the flight
//! log by [`crate::summary`] and disappears when no flight references its code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Movement summary for one airport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    /// ICAO code.
    pub code: String,
    /// Number of flights destined for this airport.
    pub arrivals: u32,
    /// Number of flights originating at this airport.
    pub departures: u32,
    /// Time of the most recent movement.
    pub last: Option<DateTime<Utc>>,
}

impl Airport {
    /// Create a summary record.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        arrivals: u32,
        departures: u32,
        last: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code: code.into(),
            arrivals,
            departures,
            last,
        }
    }

    /// Arrivals plus departures.
    #[must_use]
    pub fn movements(&self) -> u32 {
        self.arrivals.saturating_add(self.departures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movements() {
        let airport = Airport::new("KORD", 3, 4, None);
        assert_eq!(airport.movements(), 7);
    }

    #[test]
    fn test_movements_saturates() {
        let airport = Airport::new("KORD", u32::MAX, 1, None);
        assert_eq!(airport.movements(), u32::MAX);
    }

    #[test]
    fn test_serialization_field_names() {
        let airport = Airport::new("EGLL", 1, 0, None);
        let json = serde_json::to_value(&airport).unwrap();
        assert_eq!(json["code"], "EGLL");
        assert_eq!(json["arrivals"], 1);
        assert!(json["last"].is_null());
    }
}
