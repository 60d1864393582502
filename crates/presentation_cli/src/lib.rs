//! busctl presentation layer
//!
//! Command-line front-end for the bus system backend: argument parsing,
//! configuration loading, rendering of results and user-facing error
//! reporting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod reporter;

pub use cli::{Cli, Commands, LineArgs};
pub use commands::{CommandError, OutputFormat, run};
pub use config::AppConfig;
pub use reporter::ConsoleReporter;
