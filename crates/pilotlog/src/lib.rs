//! `pilotlog` - A flight logbook service
//!
//! This library records flights through their open, complete and invalid
//! states, keeps a per-airport summary of movements derived from those
//! flights, and exposes both over an HTTP API with JSON, XML and CSV reports.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod airport;
pub mod cli;
pub mod config;
pub mod error;
pub mod flight;
pub mod lifecycle;
pub mod logbook;
pub mod logging;
pub mod paging;
pub mod report;
pub mod server;
pub mod storage;
pub mod summary;

pub use airport::Airport;
pub use config::Config;
pub use error::{Error, Result};
pub use flight::{Flight, FlightExample, FlightStatus};
pub use lifecycle::FlightPage;
pub use logbook::Logbook;
pub use logging::init_logging;
pub use paging::{Page, PageRequest, Sort};
pub use storage::{AirportStore, FlightStore, Storage, StorageStats};
