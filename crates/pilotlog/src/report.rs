//! Bulk report encoding.
//!
//! Flights and airports can be exported as JSON, XML or CSV. The HTTP server
//! serves these from the `.json`, `.xml` and `.csv` listing endpoints and the
//! CLI writes them to stdout.

use serde::Serialize;

use crate::airport::Airport;
use crate::error::{Error, Result};
use crate::flight::Flight;

/// Column headers of the flight CSV report.
pub const FLIGHT_CSV_HEADERS: [&str; 12] = [
    "id",
    "callsign",
    "aircraft",
    "origin",
    "destination",
    "start_time",
    "end_time",
    "start_fuel",
    "end_fuel",
    "start_odometer",
    "end_odometer",
    "status",
];

/// Column headers of the airport CSV report.
pub const AIRPORT_CSV_HEADERS: [&str; 4] = ["code", "arrivals", "departures", "last"];

/// Encoding of a bulk report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// A JSON array.
    Json,
    /// An XML document with one element per record.
    Xml,
    /// Comma-separated values with a header row.
    Csv,
}

impl ReportFormat {
    /// HTTP content type of the encoded report.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "text/xml",
            Self::Csv => "text/csv",
        }
    }
}

#[derive(Serialize)]
#[serde(rename = "flights")]
struct FlightList<'a> {
    flight: &'a [Flight],
}

#[derive(Serialize)]
#[serde(rename = "airports")]
struct AirportList<'a> {
    airport: &'a [Airport],
}

/// Encode a list of flights.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render_flights(flights: &[Flight], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(flights)?),
        ReportFormat::Xml => Ok(quick_xml::se::to_string(&FlightList { flight: flights })?),
        ReportFormat::Csv => write_csv(&FLIGHT_CSV_HEADERS, flights),
    }
}

/// Encode a list of airport summaries.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render_airports(airports: &[Airport], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(airports)?),
        ReportFormat::Xml => Ok(quick_xml::se::to_string(&AirportList { airport: airports })?),
        ReportFormat::Csv => write_csv(&AIRPORT_CSV_HEADERS, airports),
    }
}

/// Encode a single flight as an XML document rooted at `<flight>`.
///
/// # Errors
///
/// Returns an error if the flight cannot be serialized.
pub fn flight_to_xml(flight: &Flight) -> Result<String> {
    Ok(quick_xml::se::to_string_with_root("flight", flight)?)
}

fn write_csv<T: Serialize>(headers: &[&str], records: &[T]) -> Result<String> {
    // Headers are written by hand so an empty report still has them.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::internal(format!("failed to flush CSV report: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::internal(format!("CSV report is not UTF-8: {e}")))
}
