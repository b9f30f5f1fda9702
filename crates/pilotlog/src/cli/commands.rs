//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::flight::FlightStatus;
use crate::report::ReportFormat;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on, overriding the configuration
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,
}

/// Flight commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// Record a departure
    Depart {
        /// Radio callsign
        callsign: String,
        /// Aircraft type or registration
        aircraft: String,
        /// ICAO code of the departure airport
        origin: String,
        /// Fuel on board
        #[arg(long)]
        fuel: f64,
        /// Odometer reading
        #[arg(long)]
        odometer: f64,
    },

    /// Record the arrival of an open flight
    Arrive {
        /// Flight id
        id: i64,
        /// ICAO code of the arrival airport
        destination: String,
        /// Fuel on board
        #[arg(long)]
        fuel: f64,
        /// Odometer reading
        #[arg(long)]
        odometer: f64,
    },

    /// Mark an open flight invalid
    Invalidate {
        /// Flight id
        id: i64,
    },

    /// Show one flight
    Show {
        /// Flight id
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a flight
    Delete {
        /// Flight id
        id: i64,
    },

    /// List flights
    List {
        /// Only list flights with this status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Airport summary commands.
#[derive(Debug, Subcommand)]
pub enum AirportsCommand {
    /// List airport summaries
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Recompute every summary from the flight log
    Rebuild,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Flight status argument for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Flights still in the air
    Open,
    /// Flights that arrived
    Complete,
    /// Flights that were invalidated
    Invalid,
}

impl From<StatusArg> for FlightStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => Self::Open,
            StatusArg::Complete => Self::Complete,
            StatusArg::Invalid => Self::Invalid,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
    /// XML output
    Xml,
    /// CSV output
    Csv,
}

impl OutputFormat {
    /// The report encoding for this format, or `None` for a table.
    #[must_use]
    pub fn report_format(self) -> Option<ReportFormat> {
        match self {
            Self::Table => None,
            Self::Json => Some(ReportFormat::Json),
            Self::Xml => Some(ReportFormat::Xml),
            Self::Csv => Some(ReportFormat::Csv),
        }
    }
}
