//! Request handlers.
//!
//! Every handler moves its logbook work onto a blocking worker, where it runs
//! under the logbook mutex.
//!
//! A request that hits the timeout layer does not cancel that worker, so a
//! mutation already running still commits.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::response::Report;
use super::AppState;
use crate::airport::Airport;
use crate::error::{Error, Result};
use crate::flight::{Flight, FlightExample, FlightStatus};
use crate::lifecycle::FlightPage;
use crate::logbook::Logbook;
use crate::paging::{Page, PageRequest, Sort, AIRPORT_SORT_FIELDS, FLIGHT_SORT_FIELDS};
use crate::report::{self, ReportFormat};
use crate::storage::StorageStats;

const FLIGHT_DEFAULT_SORT: Sort = Sort::desc("start_time");
const AIRPORT_DEFAULT_SORT: Sort = Sort::asc("code");

/// Query parameters of `/departure`.
#[derive(Debug, Deserialize)]
pub struct DepartureParams {
    callsign: String,
    aircraft: String,
    airport: String,
    fuel: f64,
    odometer: f64,
}

/// Query parameters of `/arrival`.
#[derive(Debug, Deserialize)]
pub struct ArrivalParams {
    id: i64,
    airport: String,
    fuel: f64,
    odometer: f64,
}

/// Query parameters naming a single flight.
#[derive(Debug, Deserialize)]
pub struct IdParams {
    id: i64,
}

/// Paging query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
}

/// Paging query parameters with an optional status filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
    status: Option<String>,
}

/// Body of `/status`.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    service: &'static str,
    version: &'static str,
    database: String,
    stats: StorageStats,
}

impl PageParams {
    fn to_request(
        &self,
        state: &AppState,
        allowed: &[&'static str],
        default_sort: Sort,
    ) -> Result<PageRequest> {
        PageRequest::from_params(
            self.page,
            self.size,
            self.sort.as_deref(),
            &state.paging,
            allowed,
            default_sort,
        )
    }
}

impl ListParams {
    fn to_request(&self, state: &AppState) -> Result<PageRequest> {
        PageRequest::from_params(
            self.page,
            self.size,
            self.sort.as_deref(),
            &state.paging,
            FLIGHT_SORT_FIELDS,
            FLIGHT_DEFAULT_SORT,
        )
    }
}

/// Run `f` against the logbook on a blocking worker.
async fn with_logbook<T, F>(state: &AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Logbook) -> Result<T> + Send + 'static,
{
    let logbook = Arc::clone(&state.logbook);
    tokio::task::spawn_blocking(move || {
        let mut logbook = logbook
            .lock()
            .map_err(|_| Error::internal("logbook lock poisoned"))?;
        f(&mut *logbook)
    })
    .await
    .map_err(|e| Error::internal(format!("logbook task failed: {e}")))?
}

fn flight_xml(flight: &Flight) -> Result<Report> {
    Ok(Report::new(
        ReportFormat::Xml,
        report::flight_to_xml(flight)?,
    ))
}

/// `GET /api/departure`
pub async fn departure(
    State(state): State<AppState>,
    params: std::result::Result<Query<DepartureParams>, QueryRejection>,
) -> Result<Report> {
    let Query(p) = params?;
    let flight = with_logbook(&state, move |logbook| {
        logbook.begin_flight(&p.callsign, &p.aircraft, &p.airport, p.fuel, p.odometer)
    })
    .await?;
    flight_xml(&flight)
}

/// `GET /api/arrival`
pub async fn arrival(
    State(state): State<AppState>,
    params: std::result::Result<Query<ArrivalParams>, QueryRejection>,
) -> Result<Report> {
    let Query(p) = params?;
    let flight = with_logbook(&state, move |logbook| {
        logbook.end_flight(p.id, &p.airport, p.fuel, p.odometer)
    })
    .await?;
    flight_xml(&flight)
}

/// `GET /api/invalidate`
pub async fn invalidate(
    State(state): State<AppState>,
    params: std::result::Result<Query<IdParams>, QueryRejection>,
) -> Result<Report> {
    let Query(p) = params?;
    let flight = with_logbook(&state, move |logbook| logbook.invalidate_flight(p.id)).await?;
    flight_xml(&flight)
}

/// `GET /api/flights`
pub async fn list_flights(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<FlightPage>> {
    let Query(p) = params?;
    let request = p.to_request(&state)?;
    let example = match p.status.as_deref().filter(|s| !s.is_empty()) {
        Some(status) => FlightExample::with_status(status.parse::<FlightStatus>()?),
        None => FlightExample::default(),
    };

    let page = with_logbook(&state, move |logbook| {
        logbook.search_flights(&example, &request)
    })
    .await?;
    Ok(Json(page))
}

/// `POST /api/flights`
pub async fn search_flights(
    State(state): State<AppState>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
    body: std::result::Result<Json<FlightExample>, JsonRejection>,
) -> Result<Json<FlightPage>> {
    let Query(p) = params?;
    let Json(example) = body?;
    let request = p.to_request(&state, FLIGHT_SORT_FIELDS, FLIGHT_DEFAULT_SORT)?;
    let example = example.normalized();

    let page = with_logbook(&state, move |logbook| {
        logbook.search_flights(&example, &request)
    })
    .await?;
    Ok(Json(page))
}

/// `GET /api/flights/flight/{id}`
pub async fn get_flight(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Flight>> {
    let Path(id) = id?;
    let flight = with_logbook(&state, move |logbook| logbook.find_flight(id)).await?;
    Ok(Json(flight))
}

/// `DELETE /api/flights/flight/{id}`
pub async fn delete_flight(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    with_logbook(&state, move |logbook| logbook.delete_flight(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn flights_report(state: &AppState, format: ReportFormat) -> Result<Report> {
    let flights = with_logbook(state, |logbook| logbook.find_all_flights()).await?;
    Ok(Report::new(format, report::render_flights(&flights, format)?))
}

/// `GET /api/flights.json`
pub async fn flights_json(State(state): State<AppState>) -> Result<Report> {
    flights_report(&state, ReportFormat::Json).await
}

/// `GET /api/flights.xml`
pub async fn flights_xml(State(state): State<AppState>) -> Result<Report> {
    flights_report(&state, ReportFormat::Xml).await
}

/// `GET /api/flights.csv`
pub async fn flights_csv(State(state): State<AppState>) -> Result<Report> {
    flights_report(&state, ReportFormat::Csv).await
}

/// `GET /api/airports`
pub async fn list_airports(
    State(state): State<AppState>,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<Airport>>> {
    let Query(p) = params?;
    let request = p.to_request(&state, AIRPORT_SORT_FIELDS, AIRPORT_DEFAULT_SORT)?;
    let page = with_logbook(&state, move |logbook| logbook.find_airports_page(&request)).await?;
    Ok(Json(page))
}

async fn airports_report(state: &AppState, format: ReportFormat) -> Result<Report> {
    let airports = with_logbook(state, |logbook| logbook.find_all_airports()).await?;
    Ok(Report::new(
        format,
        report::render_airports(&airports, format)?,
    ))
}

/// `GET /api/airports.json`
pub async fn airports_json(State(state): State<AppState>) -> Result<Report> {
    airports_report(&state, ReportFormat::Json).await
}

/// `GET /api/airports.xml`
pub async fn airports_xml(State(state): State<AppState>) -> Result<Report> {
    airports_report(&state, ReportFormat::Xml).await
}

/// `GET /api/airports.csv`
pub async fn airports_csv(State(state): State<AppState>) -> Result<Report> {
    airports_report(&state, ReportFormat::Csv).await
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Result<Json<ServiceStatus>> {
    let (database, stats) = with_logbook(&state, |logbook| {
        let database = logbook.storage().path().display().to_string();
        Ok((database, logbook.stats()?))
    })
    .await?;

    Ok(Json(ServiceStatus {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database,
        stats,
    }))
}
