//! Core flight types for pilotlog.
//!
//! A [`Flight`] is created open at departure and is closed exactly once, either
//! by an arrival (complete) or by invalidation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The current time at the precision flights are stored with.
#[must_use]
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Lifecycle status of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightStatus {
    /// Departed and not yet closed.
    Open,
    /// Arrived at a destination.
    Complete,
    /// Abandoned before arrival.
    Invalid,
}

impl FlightStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Open, Self::Complete, Self::Invalid];

    /// Returns `true` if no transition is defined away from this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// The stored and serialized name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Complete => "COMPLETE",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_request(format!("unknown flight status: {s}")))
    }
}

/// A single logged trip.
///
/// The arrival fields (`destination`, `end_time`, `end_fuel`, `end_odometer`)
/// stay unset while the flight is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Identifier assigned by the storage layer.
    pub id: Option<i64>,
    /// Radio callsign flown under.
    pub callsign: String,
    /// Aircraft type or registration.
    pub aircraft: String,
    /// ICAO code of the departure airport.
    pub origin: String,
    /// ICAO code of the arrival airport.
    pub destination: Option<String>,
    /// When the flight departed.
    pub start_time: DateTime<Utc>,
    /// When the flight arrived.
    pub end_time: Option<DateTime<Utc>>,
    /// Fuel on board at departure.
    pub start_fuel: f64,
    /// Fuel on board at arrival.
    pub end_fuel: Option<f64>,
    /// Odometer reading at departure.
    pub start_odometer: f64,
    /// Odometer reading at arrival.
    pub end_odometer: Option<f64>,
    /// Lifecycle status.
    pub status: FlightStatus,
}

impl Flight {
    /// Create a new open flight departing now.
    #[must_use]
    pub fn depart(
        callsign: impl Into<String>,
        aircraft: impl Into<String>,
        origin: impl Into<String>,
        start_fuel: f64,
        start_odometer: f64,
    ) -> Self {
        Self {
            id: None,
            callsign: callsign.into(),
            aircraft: aircraft.into(),
            origin: origin.into(),
            destination: None,
            start_time: timestamp_now(),
            end_time: None,
            start_fuel,
            end_fuel: None,
            start_odometer,
            end_odometer: None,
            status: FlightStatus::Open,
        }
    }

    /// Check if the flight is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == FlightStatus::Open
    }

    /// Whole minutes between departure and arrival, if the flight has arrived.
    #[must_use]
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| end.signed_duration_since(self.start_time).num_minutes())
    }

    /// Fuel used between departure and arrival.
    #[must_use]
    pub fn fuel_used(&self) -> Option<f64> {
        self.end_fuel.map(|end| self.start_fuel - end)
    }

    /// Airport codes whose summaries depend on this flight.
    #[must_use]
    pub fn airports(&self) -> Vec<String> {
        let mut codes = vec![self.origin.clone()];
        if let Some(destination) = &self.destination {
            if destination != &self.origin {
                codes.push(destination.clone());
            }
        }
        codes
    }
}

/// A partially filled flight used to filter searches.
///
/// Every field that is set must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightExample {
    /// Match on callsign.
    pub callsign: Option<String>,
    /// Match on aircraft.
    pub aircraft: Option<String>,
    /// Match on departure airport.
    pub origin: Option<String>,
    /// Match on arrival airport.
    pub destination: Option<String>,
    /// Match on lifecycle status.
    pub status: Option<FlightStatus>,
}

impl FlightExample {
    /// An example matching only the given status.
    #[must_use]
    pub fn with_status(status: FlightStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Drop empty strings so that blank form fields do not filter.
    #[must_use]
    pub fn normalized(self) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            callsign: keep(self.callsign),
            aircraft: keep(self.aircraft),
            origin: keep(self.origin),
            destination: keep(self.destination),
            status: self.status,
        }
    }
}
