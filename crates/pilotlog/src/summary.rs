//! Airport summary aggregation.
//!
//! Airport records are a materialized view of the flight log. They are never
//! adjusted incrementally: [`compute_summary`] derives a record for one code
//! from scratch and [`update_summary`] writes or deletes it, so repeated runs
//! over the same flights always converge on the same rows.

use std::collections::BTreeSet;

use tracing::debug;

use crate::airport::Airport;
use crate::error::Result;
use crate::paging::{Page, PageRequest};
use crate::storage::{AirportStore, FlightStore};

/// What [`update_summary`] did to one airport record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryChange {
    /// The record was created or overwritten.
    Saved(Airport),
    /// The record existed and had no movements left.
    Deleted(String),
    /// No flight references the code and no record existed.
    Unchanged(String),
}

/// Derive the summary for `code` from the flight log.
///
/// Departures count every flight originating at `code`, whatever its status.
/// `last` is the later of the most recent departure's start time and the most
/// recent arrival's end time. Returns `None` when the airport has no movements.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn compute_summary<S: FlightStore + ?Sized>(store: &S, code: &str) -> Result<Option<Airport>> {
    let departures = store.count_by_origin(code)?;
    let arrivals = store.count_by_destination(code)?;
    if departures == 0 && arrivals == 0 {
        return Ok(None);
    }

    let last_departure = if departures > 0 {
        store.latest_departure(code)?.map(|f| f.start_time)
    } else {
        None
    };
    let last_arrival = if arrivals > 0 {
        store.latest_arrival(code)?.and_then(|f| f.end_time)
    } else {
        None
    };

    Ok(Some(Airport::new(
        code,
        arrivals,
        departures,
        last_departure.max(last_arrival),
    )))
}

/// Recompute and persist the summaries for `codes`.
///
/// Each code is handled independently. Callers are expected to run this inside
/// the same transaction as the flight change that made it necessary.
///
/// # Errors
///
/// Returns an error if any database operation fails.
pub fn update_summary<S, C>(store: &S, codes: &[C]) -> Result<Vec<SummaryChange>>
where
    S: FlightStore + AirportStore + ?Sized,
    C: AsRef<str>,
{
    let mut changes = Vec::with_capacity(codes.len());

    for code in codes {
        let code = code.as_ref();
        let change = match compute_summary(store, code)? {
            Some(airport) => {
                store.save_airport(&airport)?;
                SummaryChange::Saved(airport)
            }
            None if store.delete_airport(code)? => SummaryChange::Deleted(code.to_string()),
            None => SummaryChange::Unchanged(code.to_string()),
        };
        debug!("Airport summary for {}: {:?}", code, change);
        changes.push(change);
    }

    Ok(changes)
}

/// Recompute every summary from the flight log.
///
/// Covers every code referenced by a flight plus every stored record, so
/// stale records for airports no flight mentions any more are removed.
///
/// # Errors
///
/// Returns an error if any database operation fails.
pub fn rebuild_summaries<S>(store: &S) -> Result<Vec<SummaryChange>>
where
    S: FlightStore + AirportStore + ?Sized,
{
    let codes: BTreeSet<String> = store
        .referenced_airports()?
        .into_iter()
        .chain(store.airport_codes()?)
        .collect();
    let codes: Vec<String> = codes.into_iter().collect();
    update_summary(store, &codes)
}

/// Every airport summary, ordered by code.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_all_airports<S: AirportStore + ?Sized>(store: &S) -> Result<Vec<Airport>> {
    store.all_airports()
}

/// One page of airport summaries.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn find_airports_page<S: AirportStore + ?Sized>(
    store: &S,
    request: &PageRequest,
) -> Result<Page<Airport>> {
    store.airports_page(request)
}
