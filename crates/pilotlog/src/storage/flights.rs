//! `FlightStore` implementation over a `SQLite` connection.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use super::{decode_time, encode_time, to_count, FlightStore};
use crate::error::{Error, Result};
use crate::flight::{Flight, FlightExample, FlightStatus};
use crate::paging::{Page, PageRequest};

const FLIGHT_COLUMNS: &str = "id, callsign, aircraft, origin, destination, start_time, end_time, \
     start_fuel, end_fuel, start_odometer, end_odometer, status";

impl FlightStore for Connection {
    fn create_flight(&self, flight: &Flight) -> Result<i64> {
        self.execute(
            r"
            INSERT INTO flights (callsign, aircraft, origin, destination, start_time, end_time,
                                 start_fuel, end_fuel, start_odometer, end_odometer, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                flight.callsign,
                flight.aircraft,
                flight.origin,
                flight.destination,
                encode_time(&flight.start_time),
                flight.end_time.as_ref().map(encode_time),
                flight.start_fuel,
                flight.end_fuel,
                flight.start_odometer,
                flight.end_odometer,
                flight.status.as_str(),
            ],
        )?;

        let id = self.last_insert_rowid();
        debug!("Inserted flight with id {}", id);
        Ok(id)
    }

    fn find_flight(&self, id: i64) -> Result<Option<Flight>> {
        let flight = self
            .query_row(
                &format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?1"),
                [id],
                row_to_flight,
            )
            .optional()?;
        Ok(flight)
    }

    fn update_flight(&self, flight: &Flight) -> Result<()> {
        let id = flight
            .id
            .ok_or_else(|| Error::internal("cannot update a flight that was never stored"))?;

        let affected = self.execute(
            r"
            UPDATE flights SET
                callsign = ?2, aircraft = ?3, origin = ?4, destination = ?5,
                start_time = ?6, end_time = ?7, start_fuel = ?8, end_fuel = ?9,
                start_odometer = ?10, end_odometer = ?11, status = ?12
            WHERE id = ?1
            ",
            params![
                id,
                flight.callsign,
                flight.aircraft,
                flight.origin,
                flight.destination,
                encode_time(&flight.start_time),
                flight.end_time.as_ref().map(encode_time),
                flight.start_fuel,
                flight.end_fuel,
                flight.start_odometer,
                flight.end_odometer,
                flight.status.as_str(),
            ],
        )?;

        if affected == 0 {
            return Err(Error::FlightNotFound { id });
        }
        debug!("Updated flight {} to status {}", id, flight.status);
        Ok(())
    }

    fn delete_flight(&self, id: i64) -> Result<bool> {
        let affected = self.execute("DELETE FROM flights WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    fn count_by_origin(&self, code: &str) -> Result<u32> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM flights WHERE origin = ?1",
            [code],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    fn count_by_destination(&self, code: &str) -> Result<u32> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM flights WHERE destination = ?1",
            [code],
            |row| row.get(0),
        )?;
        Ok(to_count(count))
    }

    fn latest_departure(&self, code: &str) -> Result<Option<Flight>> {
        let flight = self
            .query_row(
                &format!(
                    "SELECT {FLIGHT_COLUMNS} FROM flights WHERE origin = ?1 \
                     ORDER BY start_time DESC, id DESC LIMIT 1"
                ),
                [code],
                row_to_flight,
            )
            .optional()?;
        Ok(flight)
    }

    fn latest_arrival(&self, code: &str) -> Result<Option<Flight>> {
        let flight = self
            .query_row(
                &format!(
                    "SELECT {FLIGHT_COLUMNS} FROM flights \
                     WHERE destination = ?1 AND end_time IS NOT NULL \
                     ORDER BY end_time DESC, id DESC LIMIT 1"
                ),
                [code],
                row_to_flight,
            )
            .optional()?;
        Ok(flight)
    }

    fn all_flights(&self) -> Result<Vec<Flight>> {
        self.flights_matching(&FlightExample::default())
    }

    fn flights_matching(&self, example: &FlightExample) -> Result<Vec<Flight>> {
        let (filter, values) = example_filter(example);
        let mut stmt = self.prepare(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights{filter} ORDER BY id ASC"
        ))?;
        let flights = stmt
            .query_map(params_from_iter(values.iter()), row_to_flight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(flights)
    }

    fn flights_page(&self, example: &FlightExample, request: &PageRequest) -> Result<Page<Flight>> {
        let (filter, mut values) = example_filter(example);

        let total: i64 = self.query_row(
            &format!("SELECT COUNT(*) FROM flights{filter}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let limit_param = values.len() + 1;
        let offset_param = values.len() + 2;
        values.push(Value::Integer(request.limit()));
        values.push(Value::Integer(request.offset()));

        let mut stmt = self.prepare(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights{filter} \
             ORDER BY {} {}, id ASC LIMIT ?{limit_param} OFFSET ?{offset_param}",
            request.sort.field,
            request.sort.direction.as_sql(),
        ))?;
        let content = stmt
            .query_map(params_from_iter(values.iter()), row_to_flight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Page::new(
            content,
            request,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    fn referenced_airports(&self) -> Result<Vec<String>> {
        let mut stmt = self.prepare(
            r"
            SELECT origin FROM flights
            UNION
            SELECT destination FROM flights WHERE destination IS NOT NULL
            ORDER BY 1
            ",
        )?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(codes)
    }
}

/// Build a `WHERE` clause and its positional values for `example`.
fn example_filter(example: &FlightExample) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    let text_fields = [
        ("callsign", &example.callsign),
        ("aircraft", &example.aircraft),
        ("origin", &example.origin),
        ("destination", &example.destination),
    ];
    for (column, value) in text_fields {
        if let Some(value) = value {
            values.push(Value::Text(value.clone()));
            clauses.push(format!("{column} = ?{}", values.len()));
        }
    }
    if let Some(status) = example.status {
        values.push(Value::Text(status.as_str().to_string()));
        clauses.push(format!("status = ?{}", values.len()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// Convert a database row to a Flight struct.
fn row_to_flight(row: &Row) -> rusqlite::Result<Flight> {
    let start_time: String = row.get(5)?;
    let end_time: Option<String> = row.get(6)?;
    let status: String = row.get(11)?;

    let status = status.parse::<FlightStatus>().map_err(|e| {
        warn!("Unknown flight status in database: {}", status);
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            e.to_string().into(),
        )
    })?;

    Ok(Flight {
        id: Some(row.get(0)?),
        callsign: row.get(1)?,
        aircraft: row.get(2)?,
        origin: row.get(3)?,
        destination: row.get(4)?,
        start_time: decode_time(5, &start_time)?,
        end_time: end_time.map(|t| decode_time(6, &t)).transpose()?,
        start_fuel: row.get(7)?,
        end_fuel: row.get(8)?,
        start_odometer: row.get(9)?,
        end_odometer: row.get(10)?,
        status,
    })
}
