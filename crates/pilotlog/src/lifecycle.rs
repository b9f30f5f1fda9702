//! Flight lifecycle transitions.
//!
//! A flight is created open by a departure and leaves the open state exactly
//! once:
//!
//! ```text
//! OPEN ──arrival──▶ COMPLETE
//!   └───invalidate──▶ INVALID
//! ```
//!
//! Both closed states are terminal. Every function here works against any
//! [`FlightStore`], so callers decide the transaction boundary.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::flight::{timestamp_now, Flight, FlightExample, FlightStatus};
use crate::paging::{Page, PageRequest};
use crate::storage::FlightStore;

/// A page of flights with flight-time totals.
///
/// Durations are whole minutes. `other_duration` covers the matching flights
/// that are not on this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightPage {
    /// The flights on this page and the paging metadata.
    #[serde(flatten)]
    pub page: Page<Flight>,
    /// Total duration of the flights on this page.
    pub page_duration: i64,
    /// Total duration of the matching flights on other pages.
    pub other_duration: i64,
    /// Total duration of every matching flight.
    pub total_duration: i64,
}

/// Record a departure and return the new open flight.
///
/// # Errors
///
/// Returns an error if the flight cannot be stored.
pub fn begin_flight<S: FlightStore + ?Sized>(
    store: &S,
    callsign: &str,
    aircraft: &str,
    origin: &str,
    start_fuel: f64,
    start_odometer: f64,
) -> Result<Flight> {
    let mut flight = Flight::depart(callsign, aircraft, origin, start_fuel, start_odometer);
    let id = store.create_flight(&flight)?;
    flight.id = Some(id);

    info!("Flight {} ({} in {}) departed {}", id, callsign, aircraft, origin);
    Ok(flight)
}

/// Record the arrival of an open flight.
///
/// # Errors
///
/// Returns [`Error::FlightNotFound`] for an unknown id and
/// [`Error::InvalidFlightStatus`] if the flight is no longer open.
pub fn end_flight<S: FlightStore + ?Sized>(
    store: &S,
    id: i64,
    destination: &str,
    end_fuel: f64,
    end_odometer: f64,
) -> Result<Flight> {
    let mut flight = find_open(store, id, "completed")?;

    flight.destination = Some(destination.to_string());
    flight.end_time = Some(timestamp_now().max(flight.start_time));
    flight.end_fuel = Some(end_fuel);
    flight.end_odometer = Some(end_odometer);
    flight.status = FlightStatus::Complete;
    store.update_flight(&flight)?;

    info!("Flight {} arrived at {}", id, destination);
    Ok(flight)
}

/// Invalidate an open flight.
///
/// # Errors
///
/// Returns [`Error::FlightNotFound`] for an unknown id and
/// [`Error::InvalidFlightStatus`] if the flight is no longer open.
pub fn invalidate_flight<S: FlightStore + ?Sized>(store: &S, id: i64) -> Result<Flight> {
    let mut flight = find_open(store, id, "invalidated")?;

    flight.status = FlightStatus::Invalid;
    store.update_flight(&flight)?;

    info!("Flight {} invalidated", id);
    Ok(flight)
}

/// Get a flight by id.
///
/// # Errors
///
/// Returns [`Error::FlightNotFound`] for an unknown id.
pub fn find_flight<S: FlightStore + ?Sized>(store: &S, id: i64) -> Result<Flight> {
    store.find_flight(id)?.ok_or(Error::FlightNotFound { id })
}

/// Delete a flight and return the record that was removed.
///
/// # Errors
///
/// Returns [`Error::FlightNotFound`] for an unknown id.
pub fn delete_flight<S: FlightStore + ?Sized>(store: &S, id: i64) -> Result<Flight> {
    let flight = find_flight(store, id)?;
    store.delete_flight(id)?;

    info!("Flight {} deleted", id);
    Ok(flight)
}

/// Every flight in identifier order.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_all_flights<S: FlightStore + ?Sized>(store: &S) -> Result<Vec<Flight>> {
    store.all_flights()
}

/// Every flight with the given status.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_by_status<S: FlightStore + ?Sized>(
    store: &S,
    status: FlightStatus,
) -> Result<Vec<Flight>> {
    store.flights_by_status(status)
}

/// One page of the flights with the given status.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_by_status_page<S: FlightStore + ?Sized>(
    store: &S,
    status: FlightStatus,
    request: &PageRequest,
) -> Result<Page<Flight>> {
    store.flights_by_status_page(status, request)
}

/// One page of the flights matching `example`, with duration totals.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn search_flights<S: FlightStore + ?Sized>(
    store: &S,
    example: &FlightExample,
    request: &PageRequest,
) -> Result<FlightPage> {
    let page = store.flights_page(example, request)?;
    let page_duration = total_minutes(&page.content);
    let total_duration = total_minutes(&store.flights_matching(example)?);

    Ok(FlightPage {
        page,
        page_duration,
        other_duration: total_duration - page_duration,
        total_duration,
    })
}

fn total_minutes(flights: &[Flight]) -> i64 {
    flights.iter().filter_map(Flight::duration_minutes).sum()
}

/// Load a flight and check that `action` is allowed on it.
fn find_open<S: FlightStore + ?Sized>(store: &S, id: i64, action: &'static str) -> Result<Flight> {
    let flight = find_flight(store, id)?;
    if flight.status.is_terminal() {
        warn!(
            "Rejected attempt to mark flight {} {}: status is {}",
            id, action, flight.status
        );
        return Err(Error::InvalidFlightStatus {
            id,
            status: flight.status,
            action,
        });
    }
    Ok(flight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::Sort;
    use crate::storage::Storage;
    use chrono::Duration;

    fn create_test_storage() -> Storage {
        crate::logging::init_test_logging();
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_begin_flight() {
        let storage = create_test_storage();
        let conn = storage.connection();

        let flight = begin_flight(conn, "N123AB", "C172", "KORD", 40.0, 1000.0).unwrap();

        assert!(flight.id.is_some());
        assert_eq!(flight.status, FlightStatus::Open);
        assert_eq!(flight.origin, "KORD");
        assert_eq!(flight.start_fuel, 40.0);
        assert_eq!(
            conn.find_flight(flight.id.unwrap()).unwrap(),
            Some(flight.clone())
        );
    }

    #[test]
    fn test_end_flight() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let open = begin_flight(conn, "N123AB", "C172", "KORD", 40.0, 1000.0).unwrap();

        let flight = end_flight(conn, open.id.unwrap(), "KJFK", 10.0, 1100.0).unwrap();

        assert_eq!(flight.status, FlightStatus::Complete);
        assert_eq!(flight.destination.as_deref(), Some("KJFK"));
        assert_eq!(flight.end_fuel, Some(10.0));
        assert_eq!(flight.end_odometer, Some(1100.0));
        assert!(flight.end_time.unwrap() >= flight.start_time);
        assert_eq!(find_flight(conn, open.id.unwrap()).unwrap(), flight);
    }

    #[test]
    fn test_end_time_never_precedes_start_time() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let mut future = Flight::depart("N1", "C172", "KORD", 40.0, 0.0);
        future.start_time += Duration::hours(1);
        let id = conn.create_flight(&future).unwrap();

        let flight = end_flight(conn, id, "KJFK", 10.0, 1.0).unwrap();
        assert_eq!(flight.end_time, Some(future.start_time));
    }

    #[test]
    fn test_invalidate_flight() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let open = begin_flight(conn, "N123AB", "C172", "KORD", 40.0, 1000.0).unwrap();

        let flight = invalidate_flight(conn, open.id.unwrap()).unwrap();

        assert_eq!(flight.status, FlightStatus::Invalid);
        assert!(flight.destination.is_none());
        assert!(flight.end_time.is_none());
    }

    #[test]
    fn test_invalid_flight_rejects_further_transitions() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let id = begin_flight(conn, "N1", "C172", "KORD", 40.0, 0.0)
            .unwrap()
            .id
            .unwrap();
        invalidate_flight(conn, id).unwrap();

        let err = end_flight(conn, id, "KJFK", 10.0, 1.0).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(err.to_string().contains("INVALID"));

        let err = invalidate_flight(conn, id).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_complete_flight_is_unchanged_by_rejected_invalidation() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let id = begin_flight(conn, "N1", "C172", "KORD", 40.0, 0.0)
            .unwrap()
            .id
            .unwrap();
        let complete = end_flight(conn, id, "KJFK", 10.0, 1.0).unwrap();

        let err = invalidate_flight(conn, id).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFlightStatus {
                status: FlightStatus::Complete,
                ..
            }
        ));
        assert_eq!(find_flight(conn, id).unwrap(), complete);

        assert!(end_flight(conn, id, "KBOS", 5.0, 2.0)
            .unwrap_err()
            .is_invalid_state());
        assert_eq!(find_flight(conn, id).unwrap(), complete);
    }

    #[test]
    fn test_missing_flight_is_not_found() {
        let storage = create_test_storage();
        let conn = storage.connection();

        assert!(end_flight(conn, 42, "KJFK", 10.0, 1.0)
            .unwrap_err()
            .is_not_found());
        assert!(invalidate_flight(conn, 42).unwrap_err().is_not_found());
        assert!(find_flight(conn, 42).unwrap_err().is_not_found());
        assert!(delete_flight(conn, 42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_flight() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let flight = begin_flight(conn, "N1", "C172", "KORD", 40.0, 0.0).unwrap();
        let id = flight.id.unwrap();

        assert_eq!(delete_flight(conn, id).unwrap(), flight);
        assert!(find_flight(conn, id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_all_and_by_status() {
        let storage = create_test_storage();
        let conn = storage.connection();
        let a = begin_flight(conn, "A", "C172", "KORD", 40.0, 0.0).unwrap();
        let b = begin_flight(conn, "B", "C172", "KORD", 40.0, 0.0).unwrap();
        begin_flight(conn, "C", "C172", "KORD", 40.0, 0.0).unwrap();
        end_flight(conn, a.id.unwrap(), "KJFK", 1.0, 1.0).unwrap();
        invalidate_flight(conn, b.id.unwrap()).unwrap();

        let all: Vec<_> = find_all_flights(conn)
            .unwrap()
            .into_iter()
            .map(|f| f.callsign)
            .collect();
        assert_eq!(all, vec!["A", "B", "C"]);

        let open = find_by_status(conn, FlightStatus::Open).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].callsign, "C");

        let request = PageRequest::new(0, 10, Sort::asc("id")).unwrap();
        let invalid = find_by_status_page(conn, FlightStatus::Invalid, &request).unwrap();
        assert_eq!(invalid.total_elements, 1);
        assert_eq!(invalid.content[0].callsign, "B");
    }

    #[test]
    fn test_search_flights_duration_totals() {
        let storage = create_test_storage();
        let conn = storage.connection();
        for (callsign, minutes) in [("A", 30), ("B", 45), ("C", 60)] {
            let mut flight = Flight::depart(callsign, "C172", "KORD", 40.0, 0.0);
            flight.destination = Some("KJFK".to_string());
            flight.end_time = Some(flight.start_time + Duration::minutes(minutes));
            flight.status = FlightStatus::Complete;
            conn.create_flight(&flight).unwrap();
        }
        conn.create_flight(&Flight::depart("D", "C172", "KORD", 40.0, 0.0))
            .unwrap();

        let request = PageRequest::new(0, 2, Sort::asc("callsign")).unwrap();
        let page = search_flights(conn, &FlightExample::default(), &request).unwrap();

        assert_eq!(page.page.content.len(), 2);
        assert_eq!(page.page.total_elements, 4);
        assert_eq!(page.page_duration, 75);
        assert_eq!(page.total_duration, 135);
        assert_eq!(page.other_duration, 60);
    }

    #[test]
    fn test_search_flights_by_example() {
        let storage = create_test_storage();
        let conn = storage.connection();
        begin_flight(conn, "A", "C172", "KORD", 40.0, 0.0).unwrap();
        begin_flight(conn, "B", "PA28", "KORD", 40.0, 0.0).unwrap();

        let example = FlightExample {
            aircraft: Some("PA28".to_string()),
            ..FlightExample::default()
        };
        let request = PageRequest::new(0, 10, Sort::desc("start_time")).unwrap();
        let page = search_flights(conn, &example, &request).unwrap();

        assert_eq!(page.page.total_elements, 1);
        assert_eq!(page.page.content[0].callsign, "B");
        assert_eq!(page.total_duration, 0);
    }

    #[test]
    fn test_flight_page_serializes_flat() {
        let request = PageRequest::new(0, 10, Sort::asc("id")).unwrap();
        let page = FlightPage {
            page: Page::new(vec![], &request, 0),
            page_duration: 0,
            other_duration: 0,
            total_duration: 0,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json["content"].is_array());
        assert_eq!(json["total_elements"], 0);
        assert_eq!(json["page_duration"], 0);
    }
}
