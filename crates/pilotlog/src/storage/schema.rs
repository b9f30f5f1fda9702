//! `SQLite` schema definitions for pilotlog.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the flights table.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    callsign TEXT NOT NULL,
    aircraft TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT,
    start_time TEXT NOT NULL,
    end_time TEXT,
    start_fuel REAL NOT NULL,
    end_fuel REAL,
    start_odometer REAL NOT NULL,
    end_odometer REAL,
    status TEXT NOT NULL CHECK (status IN ('OPEN', 'COMPLETE', 'INVALID'))
)
";

/// Index supporting departure counts and latest-departure lookups.
pub const CREATE_ORIGIN_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_origin ON flights(origin, start_time DESC)
";

/// Index supporting arrival counts and latest-arrival lookups.
pub const CREATE_DESTINATION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_destination ON flights(destination, end_time DESC)
";

/// Index on `status` for filtering.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_status ON flights(status)
";

/// SQL statement to create the airports summary table.
pub const CREATE_AIRPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS airports (
    code TEXT PRIMARY KEY,
    arrivals INTEGER NOT NULL CHECK (arrivals >= 0),
    departures INTEGER NOT NULL CHECK (departures >= 0),
    last TEXT
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_FLIGHTS_TABLE,
    CREATE_ORIGIN_INDEX,
    CREATE_DESTINATION_INDEX,
    CREATE_STATUS_INDEX,
    CREATE_AIRPORTS_TABLE,
    CREATE_METADATA_TABLE,
];
