//! `AirportStore` implementation over a `SQLite` connection.

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{decode_time, encode_time, to_count, AirportStore};
use crate::airport::Airport;
use crate::error::Result;
use crate::paging::{Page, PageRequest};

impl AirportStore for Connection {
    fn find_airport(&self, code: &str) -> Result<Option<Airport>> {
        let airport = self
            .query_row(
                "SELECT code, arrivals, departures, last FROM airports WHERE code = ?1",
                [code],
                row_to_airport,
            )
            .optional()?;
        Ok(airport)
    }

    fn save_airport(&self, airport: &Airport) -> Result<()> {
        self.execute(
            r"
            INSERT INTO airports (code, arrivals, departures, last)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(code) DO UPDATE SET
                arrivals = excluded.arrivals,
                departures = excluded.departures,
                last = excluded.last
            ",
            params![
                airport.code,
                airport.arrivals,
                airport.departures,
                airport.last.as_ref().map(encode_time),
            ],
        )?;
        debug!(
            "Saved airport {} ({} arrivals, {} departures)",
            airport.code, airport.arrivals, airport.departures
        );
        Ok(())
    }

    fn delete_airport(&self, code: &str) -> Result<bool> {
        let affected = self.execute("DELETE FROM airports WHERE code = ?1", [code])?;
        if affected > 0 {
            debug!("Deleted airport {}", code);
        }
        Ok(affected > 0)
    }

    fn all_airports(&self) -> Result<Vec<Airport>> {
        let mut stmt =
            self.prepare("SELECT code, arrivals, departures, last FROM airports ORDER BY code")?;
        let airports = stmt
            .query_map([], row_to_airport)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(airports)
    }

    fn airports_page(&self, request: &PageRequest) -> Result<Page<Airport>> {
        let total: i64 = self.query_row("SELECT COUNT(*) FROM airports", [], |row| row.get(0))?;

        let mut stmt = self.prepare(&format!(
            "SELECT code, arrivals, departures, last FROM airports \
             ORDER BY {} {}, code ASC LIMIT ?1 OFFSET ?2",
            request.sort.field,
            request.sort.direction.as_sql(),
        ))?;
        let content = stmt
            .query_map([request.limit(), request.offset()], row_to_airport)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page::new(
            content,
            request,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    fn airport_codes(&self) -> Result<Vec<String>> {
        let mut stmt = self.prepare("SELECT code FROM airports ORDER BY code")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(codes)
    }
}

/// Convert a database row to an Airport struct.
fn row_to_airport(row: &Row) -> rusqlite::Result<Airport> {
    let arrivals: i64 = row.get(1)?;
    let departures: i64 = row.get(2)?;
    let last: Option<String> = row.get(3)?;

    Ok(Airport {
        code: row.get(0)?,
        arrivals: to_count(arrivals),
        departures: to_count(departures),
        last: last.map(|t| decode_time(3, &t)).transpose()?,
    })
}
