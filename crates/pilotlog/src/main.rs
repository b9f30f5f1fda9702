//! `pilotlog` - CLI and HTTP server for the flight log.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;

use pilotlog::cli::{
    AirportsCommand, Cli, Command, ConfigCommand, FlightCommand, OutputFormat, ServeCommand,
};
use pilotlog::report::{self, ReportFormat};
use pilotlog::summary::SummaryChange;
use pilotlog::{init_logging, Airport, Config, Flight, Logbook};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, &serve_cmd),
        Command::Flight(flight_cmd) => handle_flight(&config, flight_cmd),
        Command::Airports(airports_cmd) => handle_airports(&config, &airports_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_logbook(config: &Config) -> anyhow::Result<Logbook> {
    Logbook::open(config).with_context(|| {
        format!(
            "failed to open logbook at {}",
            config.database_path().display()
        )
    })
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    let logbook = open_logbook(&config)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(pilotlog::server::serve(&config, logbook))?;
    Ok(())
}

fn handle_flight(config: &Config, cmd: FlightCommand) -> anyhow::Result<()> {
    let mut logbook = open_logbook(config)?;

    match cmd {
        FlightCommand::Depart {
            callsign,
            aircraft,
            origin,
            fuel,
            odometer,
        } => {
            let flight = logbook.begin_flight(&callsign, &aircraft, &origin, fuel, odometer)?;
            println!(
                "Flight {} departed {} at {}",
                flight_id(&flight),
                flight.origin,
                format_time(Some(flight.start_time))
            );
        }
        FlightCommand::Arrive {
            id,
            destination,
            fuel,
            odometer,
        } => {
            let flight = logbook.end_flight(id, &destination, fuel, odometer)?;
            println!(
                "Flight {} arrived at {} after {} minutes",
                flight_id(&flight),
                destination,
                flight.duration_minutes().unwrap_or(0)
            );
        }
        FlightCommand::Invalidate { id } => {
            logbook.invalidate_flight(id)?;
            println!("Flight {id} invalidated");
        }
        FlightCommand::Show { id, format } => {
            let flight = logbook.find_flight(id)?;
            match format {
                OutputFormat::Table => print_flight(&flight),
                OutputFormat::Xml => println!("{}", report::flight_to_xml(&flight)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&flight)?),
                OutputFormat::Csv => {
                    print!("{}", report::render_flights(&[flight], ReportFormat::Csv)?);
                }
            }
        }
        FlightCommand::Delete { id } => {
            let flight = logbook.delete_flight(id)?;
            println!("Flight {} deleted", flight_id(&flight));
        }
        FlightCommand::List { status, format } => {
            let flights = match status {
                Some(status) => logbook.find_by_status(status.into())?,
                None => logbook.find_all_flights()?,
            };
            match format.report_format() {
                Some(format) => print_report(&report::render_flights(&flights, format)?),
                None => print_flight_table(&flights),
            }
        }
    }
    Ok(())
}

fn handle_airports(config: &Config, cmd: &AirportsCommand) -> anyhow::Result<()> {
    let mut logbook = open_logbook(config)?;

    match cmd {
        AirportsCommand::List { format } => {
            let airports = logbook.find_all_airports()?;
            match format.report_format() {
                Some(format) => print_report(&report::render_airports(&airports, format)?),
                None => print_airport_table(&airports),
            }
        }
        AirportsCommand::Rebuild => {
            let changes = logbook.rebuild_summaries()?;
            let saved = changes
                .iter()
                .filter(|c| matches!(c, SummaryChange::Saved(_)))
                .count();
            let deleted = changes
                .iter()
                .filter(|c| matches!(c, SummaryChange::Deleted(_)))
                .count();
            println!(
                "Rebuilt {} airport summaries ({saved} saved, {deleted} deleted)",
                changes.len()
            );
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let logbook = open_logbook(config)?;
    let stats = logbook.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("pilotlog status");
        println!("---------------");
        println!("Database:      {}", config.database_path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Flights:       {}", stats.total_flights);
        println!("  open:        {}", stats.open_flights);
        println!("  complete:    {}", stats.complete_flights);
        println!("  invalid:     {}", stats.invalid_flights);
        println!("Airports:      {}", stats.airports);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind);
                println!(
                    "  Request timeout:    {}s",
                    config.server.request_timeout_secs
                );
                println!();
                println!("[Paging]");
                println!("  Default page size:  {}", config.paging.default_page_size);
                println!("  Max page size:      {}", config.paging.max_page_size);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn flight_id(flight: &Flight) -> String {
    flight.id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn print_report(body: &str) {
    if body.ends_with('\n') {
        print!("{body}");
    } else {
        println!("{body}");
    }
}

fn print_flight(flight: &Flight) {
    println!("Flight {}", flight_id(flight));
    println!("  Callsign:    {}", flight.callsign);
    println!("  Aircraft:    {}", flight.aircraft);
    println!("  Status:      {}", flight.status);
    println!(
        "  Route:       {} -> {}",
        flight.origin,
        flight.destination.as_deref().unwrap_or("-")
    );
    println!("  Departed:    {}", format_time(Some(flight.start_time)));
    println!("  Arrived:     {}", format_time(flight.end_time));
    if let Some(minutes) = flight.duration_minutes() {
        println!("  Duration:    {minutes} min");
    }
    if let Some(fuel) = flight.fuel_used() {
        println!("  Fuel used:   {fuel:.1}");
    }
}

fn print_flight_table(flights: &[Flight]) {
    if flights.is_empty() {
        println!("No flights recorded.");
        return;
    }

    println!(
        "{:>6}  {:<10} {:<10} {:<6} {:<6} {:<16} {:>8}  {:<8}",
        "ID", "CALLSIGN", "AIRCRAFT", "FROM", "TO", "DEPARTED", "MINUTES", "STATUS"
    );
    for flight in flights {
        println!(
            "{:>6}  {:<10} {:<10} {:<6} {:<6} {:<16} {:>8}  {:<8}",
            flight_id(flight),
            flight.callsign,
            flight.aircraft,
            flight.origin,
            flight.destination.as_deref().unwrap_or("-"),
            format_time(Some(flight.start_time)),
            flight
                .duration_minutes()
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
            flight.status,
        );
    }
}

fn print_airport_table(airports: &[Airport]) {
    if airports.is_empty() {
        println!("No airport movements recorded.");
        return;
    }

    println!(
        "{:<6} {:>8} {:>10} {:>9}  {:<16}",
        "CODE", "ARRIVALS", "DEPARTURES", "MOVEMENTS", "LAST"
    );
    for airport in airports {
        println!(
            "{:<6} {:>8} {:>10} {:>9}  {:<16}",
            airport.code,
            airport.arrivals,
            airport.departures,
            airport.movements(),
            format_time(airport.last),
        );
    }
}
