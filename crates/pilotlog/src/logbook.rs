//! The logbook service.
//!
//! [`Logbook`] is the entry point used by the HTTP server and the CLI. Each
//! mutating call runs one lifecycle transition and refreshes the summaries of
//! the airports it touches, all inside a single transaction.

use crate::airport::Airport;
use crate::config::Config;
use crate::error::Result;
use crate::flight::{Flight, FlightExample, FlightStatus};
use crate::lifecycle::{self, FlightPage};
use crate::paging::{Page, PageRequest};
use crate::storage::{Storage, StorageStats};
use crate::summary::{self, SummaryChange};

/// Flight log backed by a [`Storage`].
#[derive(Debug)]
pub struct Logbook {
    storage: Storage,
}

impl Logbook {
    /// Wrap an open storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open the database named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self> {
        Storage::open(config.database_path()).map(Self::new)
    }

    /// Open an empty in-memory logbook.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Storage::open_in_memory().map(Self::new)
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Record a departure.
    ///
    /// # Errors
    ///
    /// Returns an error if the flight or the origin summary cannot be stored.
    pub fn begin_flight(
        &mut self,
        callsign: &str,
        aircraft: &str,
        origin: &str,
        start_fuel: f64,
        start_odometer: f64,
    ) -> Result<Flight> {
        self.storage.transaction(|tx| {
            let flight =
                lifecycle::begin_flight(tx, callsign, aircraft, origin, start_fuel, start_odometer)?;
            summary::update_summary(tx, &flight.airports())?;
            Ok(flight)
        })
    }

    /// Record the arrival of an open flight.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FlightNotFound`] or
    /// [`crate::Error::InvalidFlightStatus`] if the transition is not allowed.
    pub fn end_flight(
        &mut self,
        id: i64,
        destination: &str,
        end_fuel: f64,
        end_odometer: f64,
    ) -> Result<Flight> {
        self.storage.transaction(|tx| {
            let flight = lifecycle::end_flight(tx, id, destination, end_fuel, end_odometer)?;
            summary::update_summary(tx, &flight.airports())?;
            Ok(flight)
        })
    }

    /// Invalidate an open flight.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FlightNotFound`] or
    /// [`crate::Error::InvalidFlightStatus`] if the transition is not allowed.
    pub fn invalidate_flight(&mut self, id: i64) -> Result<Flight> {
        self.storage.transaction(|tx| {
            let flight = lifecycle::invalidate_flight(tx, id)?;
            summary::update_summary(tx, &flight.airports())?;
            Ok(flight)
        })
    }

    /// Delete a flight and refresh the summaries it contributed to.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FlightNotFound`] for an unknown id.
    pub fn delete_flight(&mut self, id: i64) -> Result<Flight> {
        self.storage.transaction(|tx| {
            let flight = lifecycle::delete_flight(tx, id)?;
            summary::update_summary(tx, &flight.airports())?;
            Ok(flight)
        })
    }

    /// Get a flight by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FlightNotFound`] for an unknown id.
    pub fn find_flight(&self, id: i64) -> Result<Flight> {
        lifecycle::find_flight(self.storage.connection(), id)
    }

    /// Every flight in identifier order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_all_flights(&self) -> Result<Vec<Flight>> {
        lifecycle::find_all_flights(self.storage.connection())
    }

    /// Every flight with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_status(&self, status: FlightStatus) -> Result<Vec<Flight>> {
        lifecycle::find_by_status(self.storage.connection(), status)
    }

    /// One page of the flights with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_by_status_page(
        &self,
        status: FlightStatus,
        request: &PageRequest,
    ) -> Result<Page<Flight>> {
        lifecycle::find_by_status_page(self.storage.connection(), status, request)
    }

    /// One page of the flights matching `example`, with duration totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search_flights(
        &self,
        example: &FlightExample,
        request: &PageRequest,
    ) -> Result<FlightPage> {
        lifecycle::search_flights(self.storage.connection(), example, request)
    }

    /// Recompute the summaries for `codes` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any database operation fails; no summary is
    /// changed in that case.
    pub fn update_summary<C: AsRef<str>>(&mut self, codes: &[C]) -> Result<Vec<SummaryChange>> {
        self.storage
            .transaction(|tx| summary::update_summary(tx, codes))
    }

    /// Recompute every airport summary from the flight log.
    ///
    /// # Errors
    ///
    /// Returns an error if any database operation fails.
    pub fn rebuild_summaries(&mut self) -> Result<Vec<SummaryChange>> {
        self.storage.transaction(|tx| summary::rebuild_summaries(tx))
    }

    /// Every airport summary, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_all_airports(&self) -> Result<Vec<Airport>> {
        summary::find_all_airports(self.storage.connection())
    }

    /// One page of airport summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_airports_page(&self, request: &PageRequest) -> Result<Page<Airport>> {
        summary::find_airports_page(self.storage.connection(), request)
    }

    /// Database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }
}
