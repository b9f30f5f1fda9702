//! Command-line interface for pilotlog.
//!
//! This module provides the CLI structure for the `pilotlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AirportsCommand, ConfigCommand, FlightCommand, OutputFormat, ServeCommand, StatusArg,
    StatusCommand,
};

/// pilotlog - Keep a flight log
///
/// Records departures and arrivals, maintains per-airport movement
/// summaries, and serves both over HTTP.
#[derive(Debug, Parser)]
#[command(name = "pilotlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Record and inspect flights
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Inspect or rebuild airport summaries
    #[command(subcommand)]
    Airports(AirportsCommand),

    /// Show logbook statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
