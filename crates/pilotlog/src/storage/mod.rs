//! Storage layer for pilotlog.
//!
//! This module provides `SQLite`-based persistent storage for flights and
//! airport summaries. Queries are expressed through the [`FlightStore`] and
//! [`AirportStore`] traits, which are implemented for [`rusqlite::Connection`]
//! so that the same code runs against a plain connection or, through deref,
//! against an open transaction.

mod airports;
mod flights;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::airport::Airport;
use crate::error::{Error, Result};
use crate::flight::{Flight, FlightExample, FlightStatus};
use crate::paging::{Page, PageRequest};

/// Queries and updates over the flight log.
pub trait FlightStore {
    /// Insert a new flight and return its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_flight(&self, flight: &Flight) -> Result<i64>;

    /// Get a flight by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_flight(&self, id: i64) -> Result<Option<Flight>>;

    /// Overwrite a stored flight with `flight`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlightNotFound`] if no row has the flight's
    /// identifier, or an error if the database operation fails.
    fn update_flight(&self, flight: &Flight) -> Result<()>;

    /// Delete a flight. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_flight(&self, id: i64) -> Result<bool>;

    /// Number of flights originating at `code`, in any status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_by_origin(&self, code: &str) -> Result<u32>;

    /// Number of flights destined for `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_by_destination(&self, code: &str) -> Result<u32>;

    /// The flight from `code` with the latest start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn latest_departure(&self, code: &str) -> Result<Option<Flight>>;

    /// The flight to `code` with the latest end time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn latest_arrival(&self, code: &str) -> Result<Option<Flight>>;

    /// All flights in identifier order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn all_flights(&self) -> Result<Vec<Flight>>;

    /// All flights matching `example`, in identifier order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn flights_matching(&self, example: &FlightExample) -> Result<Vec<Flight>>;

    /// One page of the flights matching `example`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn flights_page(&self, example: &FlightExample, request: &PageRequest) -> Result<Page<Flight>>;

    /// Every airport code named as an origin or destination, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn referenced_airports(&self) -> Result<Vec<String>>;

    /// All flights with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn flights_by_status(&self, status: FlightStatus) -> Result<Vec<Flight>> {
        self.flights_matching(&FlightExample::with_status(status))
    }

    /// One page of the flights with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn flights_by_status_page(
        &self,
        status: FlightStatus,
        request: &PageRequest,
    ) -> Result<Page<Flight>> {
        self.flights_page(&FlightExample::with_status(status), request)
    }
}

/// Reads and writes of derived airport summaries.
pub trait AirportStore {
    /// Get the summary for `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_airport(&self, code: &str) -> Result<Option<Airport>>;

    /// Insert or replace the summary for `airport.code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn save_airport(&self, airport: &Airport) -> Result<()>;

    /// Delete the summary for `code`. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_airport(&self, code: &str) -> Result<bool>;

    /// All summaries ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn all_airports(&self) -> Result<Vec<Airport>>;

    /// One page of summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn airports_page(&self, request: &PageRequest) -> Result<Page<Airport>>;

    /// Codes of all stored summaries, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn airport_codes(&self) -> Result<Vec<String>>;
}

/// Storage engine for the flight log.
///
/// Owns a single `SQLite` connection. Mutations go through
/// [`Storage::transaction`] so that a flight change and the summary updates
/// it triggers commit together.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying connection, for read-only queries.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a single transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or an error if the transaction
    /// cannot be started or committed.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction()?;
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(u64::try_from(n).unwrap_or(0))
        };

        let status_count = |status: FlightStatus| -> Result<u64> {
            let n: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM flights WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            Ok(u64::try_from(n).unwrap_or(0))
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_flights: count("SELECT COUNT(*) FROM flights")?,
            open_flights: status_count(FlightStatus::Open)?,
            complete_flights: status_count(FlightStatus::Complete)?,
            invalid_flights: status_count(FlightStatus::Invalid)?,
            airports: count("SELECT COUNT(*) FROM airports")?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of flights stored.
    pub total_flights: u64,
    /// Flights still open.
    pub open_flights: u64,
    /// Flights that arrived.
    pub complete_flights: u64,
    /// Flights that were invalidated.
    pub invalid_flights: u64,
    /// Airport summaries stored.
    pub airports: u64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Encode a timestamp in the fixed-width form used by every time column.
///
/// A fixed precision and a `Z` suffix keep lexical order equal to time order.
pub(crate) fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp in column `idx`.
pub(crate) fn decode_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Convert a `COUNT(*)` result to a movement counter.
pub(crate) fn to_count(n: i64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
