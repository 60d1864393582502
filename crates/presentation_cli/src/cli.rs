//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use integration_bus::LineDefinition;

/// busctl
#[derive(Debug, Parser)]
#[command(name = "busctl")]
#[command(author, version, about = "Bus system query and administration CLI", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML); defaults to ./busctl.toml when present
    #[arg(short, long, env = "BUSCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(short, long, env = "BUSCTL_URL", global = true)]
    pub url: Option<String>,

    /// Return backend bodies unchanged instead of unwrapping them
    #[arg(long, global = true)]
    pub raw: bool,

    /// Print JSON instead of summaries
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List stations, or search them by id or name fragment
    Stations {
        /// Search term
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Admin station lookup (lists all without a keyword)
    AdminStations {
        /// Keyword to filter by
        #[arg(short, long)]
        keyword: Option<String>,
    },

    /// Add a station; the backend geocodes its coordinates
    AddStation {
        /// Station id
        id: u32,
        /// Station name
        name: String,
    },

    /// Rename a station
    UpdateStation {
        /// Station id
        id: u32,
        /// New station name
        name: String,
    },

    /// Delete a station
    DeleteStation {
        /// Station id
        id: u32,
    },

    /// List all lines
    Routes,

    /// Add a line
    AddLine(LineArgs),

    /// Replace an existing line
    UpdateLine(LineArgs),

    /// Delete a line
    DeleteLine {
        /// Line id
        id: u32,
    },

    /// Plan routes between two stations
    ///
    /// Example: busctl plan 人民广场 火车站 --max-transfers 1
    Plan {
        /// Start station (name or id)
        start: String,
        /// Destination station (name or id)
        end: String,
        /// Maximum number of transfers (backend default: 2)
        #[arg(long)]
        max_transfers: Option<u8>,
    },

    /// Lines serving a station
    StationLines {
        /// Station id or name
        identifier: String,
    },

    /// Stations of a line
    LineStations {
        /// Line id or name
        identifier: String,
    },

    /// Download the map SDK once to check the configured access key
    MapSdk {
        /// Map provider access key, overrides the configuration
        #[arg(long, env = "BUSCTL_MAP_AK")]
        ak: Option<String>,
    },
}

/// Line definition arguments shared by `add-line` and `update-line`
#[derive(Debug, Args)]
pub struct LineArgs {
    /// Line id
    pub id: u32,

    /// Line name
    pub name: String,

    /// Direction label
    #[arg(short, long)]
    pub direction: Option<String>,

    /// First departure (HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// Last departure (HH:MM)
    #[arg(long)]
    pub finish: Option<String>,

    /// Headway in minutes
    #[arg(long)]
    pub interval: Option<u32>,

    /// Station ids in order, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub stations: Vec<u32>,
}

impl From<LineArgs> for LineDefinition {
    fn from(args: LineArgs) -> Self {
        Self {
            line_order: args.id,
            line_name: args.name,
            direction: args.direction,
            start_time: args.start,
            finish_time: args.finish,
            interval: args.interval,
            station_ids: args.stations,
        }
    }
}

/// Determine log filter level from verbosity count
#[must_use]
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_from_verbosity() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(7), "trace");
    }

    #[test]
    fn test_line_args_into_definition() {
        let args = LineArgs {
            id: 100,
            name: "测试线".to_string(),
            direction: Some("上".to_string()),
            start: Some("06:00".to_string()),
            finish: None,
            interval: Some(10),
            stations: vec![1, 2, 3],
        };

        let definition = LineDefinition::from(args);
        assert_eq!(definition.line_order, 100);
        assert_eq!(definition.start_time.as_deref(), Some("06:00"));
        assert!(definition.finish_time.is_none());
        assert_eq!(definition.station_ids, vec![1, 2, 3]);
    }
}
