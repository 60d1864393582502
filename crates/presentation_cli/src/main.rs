//! busctl
//!
//! Command-line front-end for the bus system backend.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::Parser;
use integration_bus::{ApiClient, ErrorReporter};
use presentation_cli::cli::log_filter_from_verbosity;
use presentation_cli::{AppConfig, Cli, ConsoleReporter, OutputFormat, run};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(
            cli.verbose,
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.url, cli.raw);

    let reporter = ConsoleReporter::new(cli.verbose > 0);
    let client = ApiClient::with_reporter(&config.api, Arc::new(reporter))?;
    let format = OutputFormat::from_flags(cli.json, cli.raw);

    match run(&client, &config.map, cli.command, format).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        },
        Err(err) => {
            if !err.already_reported() {
                reporter.report(&err.signal());
            }
            std::process::exit(1);
        },
    }
}
